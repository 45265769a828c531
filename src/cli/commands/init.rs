use crate::config::Workspace;
use crate::error::Result;
use crate::output::OutputContext;
use serde_json::json;
use std::path::Path;

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` unless `force`, or an I/O error.
pub fn execute(force: bool, root_dir: Option<&Path>, ctx: &OutputContext) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let paths = Workspace::init(base_dir, force)?;

    ctx.json(&json!({
        "status": "initialized",
        "path": paths.root.display().to_string(),
    }))?;
    ctx.success(&format!(
        "Initialized ticketdeck workspace in {}",
        paths.root.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputMode;
    use tempfile::TempDir;

    #[test]
    fn creates_workspace_files() {
        let temp = TempDir::new().expect("tempdir");
        let ctx = OutputContext::with_mode(OutputMode::Quiet);
        execute(false, Some(temp.path()), &ctx).expect("init");

        let root = temp.path().join(".ticketdeck");
        assert!(root.join("tasks.json").exists());
        assert!(root.join("config.yaml").exists());
        assert!(root.join("settings.yaml").exists());

        assert!(execute(false, Some(temp.path()), &ctx).is_err());
        execute(true, Some(temp.path()), &ctx).expect("forced init");
    }
}
