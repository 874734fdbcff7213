//! MCP tools exposed to the client.
//!
//! Every tool returns a JSON object that has already been through
//! [`sanitize_result`], so session cookies cannot reach the caller.

pub mod auth_status;
pub mod refresh_auth;
pub mod sanitize;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_status::auth_status;
pub use refresh_auth::{refresh_auth, BrowserCookieResult, CookieSource, NoBrowserSource};
pub use sanitize::sanitize_result;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::context::AuthContext;

/// Tool schema in MCP `tools/list` format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// `tp_auth_status`
pub struct AuthStatusTool {
    ctx: AuthContext,
}

#[async_trait]
impl Tool for AuthStatusTool {
    fn name(&self) -> &str {
        "tp_auth_status"
    }

    fn description(&self) -> &str {
        "Check TrainingPeaks authentication status. Returns whether the stored session is valid, the athlete id, and what to do if it is not."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
        let result = auth_status(self.ctx.resolver(), self.ctx.validator()).await;
        Ok(Value::Object(result))
    }
}

/// `tp_refresh_auth`
pub struct RefreshAuthTool {
    ctx: AuthContext,
    source: Arc<dyn CookieSource>,
}

#[derive(Debug, Deserialize)]
struct RefreshAuthArgs {
    #[serde(default = "default_browser")]
    browser: String,
}

fn default_browser() -> String {
    "auto".to_string()
}

#[async_trait]
impl Tool for RefreshAuthTool {
    fn name(&self) -> &str {
        "tp_refresh_auth"
    }

    fn description(&self) -> &str {
        "Refresh TrainingPeaks authentication from a browser where the user is logged in. Use when tp_auth_status reports an expired session."
    }

    fn parameters_schema(&self) -> Value {
        let mut browsers = vec!["auto"];
        browsers.extend(refresh_auth::SUPPORTED_BROWSERS);
        json!({
            "type": "object",
            "properties": {
                "browser": {
                    "type": "string",
                    "enum": browsers,
                    "description": "Browser to read the session from. 'auto' tries all of them.",
                    "default": "auto"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let args: RefreshAuthArgs = if args.is_null() {
            RefreshAuthArgs {
                browser: default_browser(),
            }
        } else {
            serde_json::from_value(args)?
        };
        let result = refresh_auth(
            self.source.as_ref(),
            &args.browser,
            self.ctx.validator(),
            self.ctx.resolver(),
        )
        .await;
        Ok(Value::Object(result))
    }
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the authentication tools.
    pub fn new(ctx: AuthContext, source: Arc<dyn CookieSource>) -> Self {
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        tools.insert(
            "tp_auth_status".to_string(),
            Arc::new(AuthStatusTool { ctx: ctx.clone() }),
        );
        tools.insert(
            "tp_refresh_auth".to_string(),
            Arc::new(RefreshAuthTool { ctx, source }),
        );
        tracing::debug!("tool registry ready with {} tools", tools.len());
        Self { tools }
    }

    /// Tool schemas for `tools/list`, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        tool.execute(args).await
    }
}
