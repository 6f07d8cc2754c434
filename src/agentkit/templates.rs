//! Python scripts executed in the sandbox, one per filesystem operation.
//!
//! Templates use `{name}` placeholders and `{{` / `}}` for literal braces.
//! Parameters are supplied through [`ScriptParams`], which only accepts
//! integers, booleans and text; text is always base64-encoded and decoded by
//! the script, so caller-controlled strings never appear in Python source.
//!
//! Every script reports through its exit status: 0 with the result on
//! stdout, non-zero with a diagnostic on stdout or stderr.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::TemplateError;

pub const READ: &str = r#"
import base64
import os
import sys

file_path = base64.b64decode('{file_path}').decode('utf-8')
offset = {offset}
limit = {limit}

if not os.path.isfile(file_path):
    print(f"Error: File not found: {{file_path}}")
    sys.exit(-1)

if os.path.getsize(file_path) == 0:
    print('System reminder: File exists but has empty contents')
    sys.exit(0)

with open(file_path, 'r') as f:
    lines = f.readlines()

for i, line in enumerate(lines[offset:offset + limit]):
    print(f"{{offset + i + 1:6d}}\t{{line.rstrip(chr(10))}}")
"#;

pub const LS: &str = r#"
import base64
import json
import os

path = base64.b64decode('{path}').decode('utf-8')

try:
    with os.scandir(path) as it:
        for entry in sorted(it, key=lambda e: e.name):
            print(json.dumps({{
                'path': entry.name,
                'is_dir': entry.is_dir(follow_symlinks=False),
            }}))
except (FileNotFoundError, PermissionError):
    pass
"#;

pub const WRITE: &str = r#"
import base64
import os
import sys

file_path = base64.b64decode('{file_path}').decode('utf-8')

if os.path.exists(file_path):
    print(f"Error: File '{{file_path}}' already exists", file=sys.stderr)
    sys.exit(-1)

os.makedirs(os.path.dirname(file_path) or '.', exist_ok=True)

content = base64.b64decode('{content}').decode('utf-8')
with open(file_path, 'w') as f:
    f.write(content)
"#;

pub const EDIT: &str = r#"
import base64
import sys

file_path = base64.b64decode('{file_path}').decode('utf-8')
old = base64.b64decode('{old}').decode('utf-8')
new = base64.b64decode('{new}').decode('utf-8')
replace_all = {replace_all}

with open(file_path, 'r') as f:
    text = f.read()

count = text.count(old)
if count == 0:
    print(f"Error: String not found in file: '{{old}}'")
    sys.exit(-1)
if count > 1 and not replace_all:
    print(f"Error: String '{{old}}' appears multiple times. Use replace_all=True to replace all occurrences.")
    sys.exit(-1)

result = text.replace(old, new) if replace_all else text.replace(old, new, 1)
with open(file_path, 'w') as f:
    f.write(result)

print(count)
"#;

pub const GREP: &str = r#"
import base64
import json
import subprocess
import sys

pattern = base64.b64decode('{pattern}').decode('utf-8')
path = base64.b64decode('{path}').decode('utf-8')
glob_pattern = base64.b64decode('{glob}').decode('utf-8')

cmd = ['grep', '-rHnF']
if glob_pattern:
    cmd.extend(['--include', glob_pattern])
cmd.extend(['-e', pattern, path or '.'])

try:
    result = subprocess.run(cmd, capture_output=True, text=True, check=False)

    # 1 means no lines matched
    if result.returncode > 1:
        print(f"Grep error: {{result.stderr}}", file=sys.stderr)
        sys.exit(result.returncode)

    for line in result.stdout.strip().splitlines():
        parts = line.split(':', 2)
        if len(parts) < 3:
            continue
        try:
            line_num = int(parts[1])
        except ValueError:
            continue
        print(json.dumps({{'Path': parts[0], 'Line': line_num, 'Content': parts[2]}}))
except Exception as e:
    print(f"Error executing grep script: {{e}}", file=sys.stderr)
    sys.exit(1)
"#;

pub const GLOB: &str = r#"
import base64
import glob
import json
import os

path = base64.b64decode('{path}').decode('utf-8')
pattern = base64.b64decode('{pattern}').decode('utf-8')

os.chdir(path)
for m in sorted(glob.glob(pattern, recursive=True)):
    st = os.stat(m)
    print(json.dumps({{
        'path': m,
        'size': st.st_size,
        'mtime': st.st_mtime,
        'is_dir': os.path.isdir(m),
    }}))
"#;

pub const EXECUTE: &str = r#"
import base64
import subprocess
import sys

command = base64.b64decode('{command}').decode('utf-8')

try:
    result = subprocess.run(command, shell=True, capture_output=True, text=True, check=False)
    if result.stderr:
        print(f"Error executing command: {{result.stderr}}", file=sys.stderr)
        sys.exit(result.returncode if result.returncode != 0 else 1)
    print(result.stdout, end='')
except Exception as e:
    print(f"Error executing command script: {{e}}", file=sys.stderr)
    sys.exit(1)
"#;

/// Named values substituted into a template, already in Python literal form.
#[derive(Debug, Clone, Default)]
pub struct ScriptParams {
    values: HashMap<&'static str, String>,
}

impl ScriptParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text; it is base64-encoded and must sit inside quotes in the template.
    pub fn text(mut self, name: &'static str, value: &str) -> Self {
        self.values.insert(name, BASE64.encode(value.as_bytes()));
        self
    }

    pub fn int(mut self, name: &'static str, value: i64) -> Self {
        self.values.insert(name, value.to_string());
        self
    }

    /// Add a boolean as a Python `True` / `False` literal.
    pub fn flag(mut self, name: &'static str, value: bool) -> Self {
        self.values
            .insert(name, if value { "True" } else { "False" }.to_string());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Substitute `params` into `template`.
pub fn render(template: &str, params: &ScriptParams) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    let mut offset = 0;

    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        let at = offset + idx;

        let consumed = if tail.starts_with("{{") {
            out.push('{');
            2
        } else if tail.starts_with("}}") {
            out.push('}');
            2
        } else if tail.starts_with('}') {
            return Err(TemplateError::UnmatchedBrace(at));
        } else {
            let close = tail
                .find('}')
                .ok_or(TemplateError::UnclosedPlaceholder(at))?;
            let name = &tail[1..close];
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder(at));
            }
            if name.contains('{') {
                return Err(TemplateError::UnclosedPlaceholder(at));
            }
            let value = params
                .get(name)
                .ok_or_else(|| TemplateError::MissingParameter(name.to_string()))?;
            out.push_str(value);
            close + 1
        };

        rest = &tail[consumed..];
        offset = at + consumed;
    }

    out.push_str(rest);
    Ok(out)
}
