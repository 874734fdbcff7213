//! `tp-mcp` subcommands.
//!
//! `serve` is dispatched by the binary before these run, since it owns
//! stdin and stdout for the MCP protocol.
//!
//! Each command writes human-readable text to `out` and returns the process
//! exit code. The session cookie is read from `input` and never echoed.

use std::io::{BufRead, Write};
use std::path::Path;

use serde_json::json;

use crate::auth::validator::AuthStatus;
use crate::context::AuthContext;

pub const HELP: &str = "\
TrainingPeaks MCP Server

Usage: tp-mcp <command>

Commands:
  auth         Authenticate with TrainingPeaks
  auth-status  Check authentication status
  auth-clear   Clear stored credentials
  config       Output MCP client config snippet
  serve        Start the MCP server on stdio
  help         Show this help message
";

/// Dispatch `args` (without the program name).
pub async fn run<R: BufRead, W: Write>(
    args: &[String],
    ctx: &AuthContext,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<i32> {
    let Some(command) = args.first() else {
        return help(out);
    };

    match command.to_lowercase().as_str() {
        "auth" => auth(ctx, input, out).await,
        "auth-status" => auth_status(ctx, out).await,
        "auth-clear" => auth_clear(ctx, out),
        "config" => {
            let exe = std::env::current_exe().unwrap_or_else(|_| "tp-mcp".into());
            config(&exe, out)
        }
        "help" | "--help" | "-h" => help(out),
        other => {
            writeln!(out, "Unknown command: {}", other)?;
            writeln!(out, "Run 'tp-mcp help' for usage.")?;
            Ok(1)
        }
    }
}

fn help<W: Write>(out: &mut W) -> anyhow::Result<i32> {
    writeln!(out, "{}", HELP)?;
    Ok(0)
}

async fn auth<R: BufRead, W: Write>(
    ctx: &AuthContext,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<i32> {
    writeln!(out, "TrainingPeaks MCP Authentication")?;
    writeln!(out, "{}", "=".repeat(40))?;
    writeln!(out)?;

    let existing = ctx.get_credential();
    if let Some(secret) = existing.secret() {
        writeln!(out, "Existing credential found. Validating...")?;
        let result = ctx.validate_auth(secret.expose()).await;
        if result.is_valid() {
            writeln!(out, "Already authenticated as: {}", display(&result.email))?;
            writeln!(out, "Athlete ID: {}", display(&result.athlete_id))?;
            writeln!(out)?;
            write!(out, "Re-authenticate? [y/N]: ")?;
            out.flush()?;
            let answer = read_line(input)?.unwrap_or_default();
            if answer.trim().to_lowercase() != "y" {
                return Ok(0);
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "To authenticate, you need the Production_tpAuth cookie from TrainingPeaks.")?;
    writeln!(out)?;
    writeln!(out, "Steps:")?;
    writeln!(out, "1. Log into TrainingPeaks in your browser")?;
    writeln!(out, "2. Open DevTools (F12) -> Network tab")?;
    writeln!(out, "3. Navigate to any page on trainingpeaks.com")?;
    writeln!(out, "4. Find a request to tpapi.trainingpeaks.com")?;
    writeln!(out, "5. Copy the 'Production_tpAuth' cookie value")?;
    writeln!(out)?;
    write!(out, "Paste cookie value: ")?;
    out.flush()?;

    let Some(cookie) = read_line(input)? else {
        writeln!(out)?;
        writeln!(out, "Cancelled.")?;
        return Ok(1);
    };
    let cookie = cookie.trim();
    if cookie.is_empty() {
        writeln!(out, "Error: No cookie provided.")?;
        return Ok(1);
    }

    writeln!(out)?;
    writeln!(out, "Validating...")?;
    let result = ctx.validate_auth(cookie).await;
    if !result.is_valid() {
        writeln!(out, "Error: {}", result.message)?;
        match result.status {
            AuthStatus::Expired => {
                writeln!(out, "The cookie may have expired. Please get a fresh cookie.")?
            }
            AuthStatus::Invalid => writeln!(
                out,
                "The cookie appears to be invalid. Check that you copied it correctly."
            )?,
            _ => {}
        }
        return Ok(1);
    }

    let stored = ctx.store_credential(cookie);
    if !stored.success {
        writeln!(out, "Error storing credential: {}", stored.message)?;
        return Ok(1);
    }

    writeln!(out)?;
    writeln!(out, "Authentication successful!")?;
    writeln!(out, "  Email: {}", display(&result.email))?;
    writeln!(out, "  Athlete ID: {}", display(&result.athlete_id))?;
    writeln!(out, "  Storage: {}", ctx.get_storage_backend())?;
    Ok(0)
}

async fn auth_status<W: Write>(ctx: &AuthContext, out: &mut W) -> anyhow::Result<i32> {
    let credential = ctx.get_credential();
    let Some(secret) = credential.secret() else {
        writeln!(out, "Not authenticated.")?;
        writeln!(out, "Run 'tp-mcp auth' to authenticate.")?;
        return Ok(1);
    };

    writeln!(out, "Checking authentication status...")?;
    let result = ctx.validate_auth(secret.expose()).await;
    if result.is_valid() {
        writeln!(out, "Authenticated")?;
        writeln!(out, "  Email: {}", display(&result.email))?;
        writeln!(out, "  Athlete ID: {}", display(&result.athlete_id))?;
        writeln!(out, "  Storage: {}", ctx.get_storage_backend())?;
        Ok(0)
    } else {
        writeln!(out, "Authentication invalid: {}", result.message)?;
        writeln!(out, "Run 'tp-mcp auth' to re-authenticate.")?;
        Ok(1)
    }
}

fn auth_clear<W: Write>(ctx: &AuthContext, out: &mut W) -> anyhow::Result<i32> {
    let result = ctx.clear_credential();
    if result.success {
        writeln!(out, "Credentials cleared.")?;
    } else {
        writeln!(out, "Note: {}", result.message)?;
    }
    Ok(0)
}

fn config<W: Write>(exe: &Path, out: &mut W) -> anyhow::Result<i32> {
    let snippet = json!({
        "trainingpeaks": {
            "command": exe.to_string_lossy(),
            "args": ["serve"],
        }
    });
    writeln!(out, "Add this to your MCP client config inside \"mcpServers\": {{}}")?;
    writeln!(out)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&snippet)?)?;
    Ok(0)
}

/// `None` on end of input.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    match input.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}

fn display<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server::TestServer;
    use crate::config::Config;
    use crate::tools::testing::resolver;
    use std::io::Cursor;
    use std::time::Duration;

    const COOKIE: &str = "SECRET_COOKIE_abc123";

    fn context(base_url: &str, env: Option<&str>) -> (tempfile::TempDir, AuthContext) {
        let (temp, resolver) = resolver(env);
        let mut config = Config::new(temp.path().to_path_buf());
        config.api_base_url = base_url.to_string();
        config.min_request_interval = Duration::from_millis(1);
        (temp, AuthContext::with_resolver(&config, resolver))
    }

    async fn run_with(ctx: &AuthContext, args: &[&str], stdin: &str) -> (i32, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let mut out = Vec::new();
        let code = run(&args, ctx, &mut input, &mut out).await.unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn help_and_unknown_command() {
        let (_temp, ctx) = context("http://127.0.0.1:9", None);

        let (code, out) = run_with(&ctx, &[], "").await;
        assert_eq!(code, 0);
        assert!(out.contains("auth-status"));

        let (code, out) = run_with(&ctx, &["frobnicate"], "").await;
        assert_eq!(code, 1);
        assert!(out.contains("Unknown command: frobnicate"));
    }

    #[tokio::test]
    async fn auth_validates_and_stores() {
        let server = TestServer::respond_with(vec![(
            200,
            r#"{"athleteId":123,"userId":456,"username":"a@b.com"}"#,
        )])
        .await;
        let (_temp, ctx) = context(&server.base_url, None);

        let (code, out) = run_with(&ctx, &["auth"], &format!("  {}  \n", COOKIE)).await;
        assert_eq!(code, 0, "{out}");
        assert!(out.contains("Authentication successful!"));
        assert!(out.contains("a@b.com"));
        assert!(!out.contains(COOKIE));
        assert_eq!(ctx.get_credential().secret().unwrap().expose(), COOKIE);
    }

    #[tokio::test]
    async fn auth_rejects_expired_cookie() {
        let server = TestServer::respond_with(vec![(401, "")]).await;
        let (_temp, ctx) = context(&server.base_url, None);

        let (code, out) = run_with(&ctx, &["auth"], "stale\n").await;
        assert_eq!(code, 1);
        assert!(out.contains("may have expired"));
        assert!(!ctx.get_credential().success);
    }

    #[tokio::test]
    async fn auth_empty_and_cancelled_input() {
        let (_temp, ctx) = context("http://127.0.0.1:9", None);

        let (code, out) = run_with(&ctx, &["auth"], "   \n").await;
        assert_eq!(code, 1);
        assert!(out.contains("No cookie provided"));

        let (code, out) = run_with(&ctx, &["auth"], "").await;
        assert_eq!(code, 1);
        assert!(out.contains("Cancelled."));
    }

    #[tokio::test]
    async fn auth_keeps_valid_session_unless_confirmed() {
        let server = TestServer::respond_with(vec![(200, r#"{"athleteId":1,"username":"a@b.com"}"#)]).await;
        let (_temp, ctx) = context(&server.base_url, None);
        ctx.store_credential("existing");

        let (code, out) = run_with(&ctx, &["auth"], "n\n").await;
        assert_eq!(code, 0);
        assert!(out.contains("Already authenticated as: a@b.com"));
        assert_eq!(server.request_count(), 1);
        assert_eq!(ctx.get_credential().secret().unwrap().expose(), "existing");
    }

    #[tokio::test]
    async fn auth_status_reports() {
        let (_temp, ctx) = context("http://127.0.0.1:9", None);
        let (code, out) = run_with(&ctx, &["auth-status"], "").await;
        assert_eq!(code, 1);
        assert!(out.contains("Not authenticated."));

        let server = TestServer::respond_with(vec![(200, r#"{"athleteId":7,"username":"x@y.z"}"#)]).await;
        let (_temp, ctx) = context(&server.base_url, Some(COOKIE));
        let (code, out) = run_with(&ctx, &["AUTH-STATUS"], "").await;
        assert_eq!(code, 0);
        assert!(out.contains("Athlete ID: 7"));
        assert!(out.contains("Storage: environment"));
        assert!(!out.contains(COOKIE));
    }

    #[tokio::test]
    async fn auth_clear_always_succeeds() {
        let (_temp, ctx) = context("http://127.0.0.1:9", None);
        ctx.store_credential("to-remove");

        let (code, out) = run_with(&ctx, &["auth-clear"], "").await;
        assert_eq!(code, 0);
        assert!(out.contains("Credentials cleared."));
        assert!(!ctx.get_credential().success);

        let (code, _) = run_with(&ctx, &["auth-clear"], "").await;
        assert_eq!(code, 0);
    }

    #[test]
    fn config_snippet_is_json() {
        let mut out = Vec::new();
        let code = config(Path::new("/usr/local/bin/tp-mcp"), &mut out).unwrap();
        assert_eq!(code, 0);
        let out = String::from_utf8(out).unwrap();
        let json_start = out.find("{\n").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out[json_start..]).unwrap();
        assert_eq!(value["trainingpeaks"]["command"], "/usr/local/bin/tp-mcp");
    }
}
