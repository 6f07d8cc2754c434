//! Walk through every filesystem operation against a live sandbox tool.
//!
//! Credentials come from `VOLC_*` variables (a `.env` file is honored):
//!
//! ```text
//! VOLC_ACCESS_KEY_ID=... VOLC_SECRET_ACCESS_KEY=... VOLC_TOOL_ID=... \
//! VOLC_USER_SESSION_ID=demo cargo run --example sandbox_walkthrough
//! ```

use agentkit_sandbox::agentkit::{Config, SandboxToolBackend};
use agentkit_sandbox::filesystem::{
    Backend, EditRequest, ExecuteRequest, GlobInfoRequest, GrepRequest, LsInfoRequest, ReadRequest,
    WriteRequest,
};
use tracing_subscriber::EnvFilter;

const WORKDIR: &str = "/home/gem";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agentkit_sandbox=debug")),
        )
        .init();

    let backend = SandboxToolBackend::new(Config::from_env()?)?;
    let file_path = format!(
        "{WORKDIR}/walkthrough-{}.txt",
        chrono::Utc::now().timestamp()
    );

    backend
        .write(WriteRequest {
            file_path: file_path.clone(),
            content: "Hello from the sandbox\nsecond line\n".to_string(),
        })
        .await?;
    println!("wrote {file_path}");

    let content = backend
        .read(ReadRequest {
            file_path: file_path.clone(),
            ..Default::default()
        })
        .await?;
    println!("read:\n{content}");

    backend
        .edit(EditRequest {
            file_path: file_path.clone(),
            old_string: "Hello".to_string(),
            new_string: "Greetings".to_string(),
            replace_all: false,
        })
        .await?;
    println!("edited {file_path}");

    let matches = backend
        .grep_raw(GrepRequest {
            path: WORKDIR.to_string(),
            pattern: "Greetings".to_string(),
            glob: "*.txt".to_string(),
        })
        .await?;
    for m in &matches {
        println!("grep: {}:{}: {}", m.path, m.line, m.content);
    }

    let entries = backend
        .ls_info(LsInfoRequest {
            path: WORKDIR.to_string(),
        })
        .await?;
    for entry in &entries {
        println!("ls: {}{}", entry.path, if entry.is_dir { "/" } else { "" });
    }

    let files = backend
        .glob_info(GlobInfoRequest {
            path: WORKDIR.to_string(),
            pattern: "*.txt".to_string(),
        })
        .await?;
    for file in &files {
        println!("glob: {} ({} bytes)", file.path, file.size);
    }

    let response = backend
        .execute(ExecuteRequest {
            command: format!("wc -l {file_path}"),
        })
        .await?;
    print!("execute: {}", response.output);

    backend
        .execute(ExecuteRequest {
            command: format!("rm -f {file_path}"),
        })
        .await?;

    Ok(())
}
