//! Offline assistant that writes a fixed hello-world app.
//!
//! Used to check an orchestrator's mounts and chaining without spending a
//! completion call.

use crate::bundle::OutputBundle;
use crate::config::{GenerationTarget, RunnerConfig};
use crate::error::{Error, Result};
use tracing::info;

/// The hello-world app for `target`. Only Python is known.
pub fn hello_world(target: &GenerationTarget) -> Result<String> {
    match target.language.as_str() {
        "python" => Ok(format!(
            r#"from flask import Flask

app = Flask(__name__)

@app.route('/')
def hello_world():
    return 'Hello, World!'

if __name__ == '__main__':
    app.run(debug=True, host="{bind}", port={port})
"#,
            bind = target.bind_address,
            port = target.port,
        )),
        other => Err(Error::invalid_argument(format!("No scaffold for language '{}'", other))
            .with_operation("scaffold::hello_world")
            .with_context("language", other)),
    }
}

/// Write the hello-world app and, when configured, the next marker
pub fn write(config: &RunnerConfig) -> Result<()> {
    let output = OutputBundle {
        source: hello_world(&config.target)?,
        explanation: None,
        next: config.next_assistant.clone(),
    };
    output.write(&config.paths)?;
    info!(path = %config.paths.source_out.display(), "scaffold written");
    Ok(())
}
