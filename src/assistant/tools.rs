//! Function tools the assistant may call during a run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::prompts::RECENT_BILLS_TOOL;
use crate::openai::{ToolCall, ToolOutput};
use crate::scrapers::{bills_tool_payload, CamaraScraper};

/// A function the assistant can invoke. Outputs are JSON strings.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name as declared on the assistant.
    fn name(&self) -> &str;

    /// Run the tool with the raw JSON arguments from the model.
    async fn call(&self, arguments: &str) -> String;
}

/// Recent bills from the Chamber of Representatives.
pub struct RecentBillsTool {
    scraper: Arc<CamaraScraper>,
    limit: usize,
}

impl RecentBillsTool {
    pub fn new(scraper: Arc<CamaraScraper>) -> Self {
        let limit = scraper.config().tool_limit;
        Self { scraper, limit }
    }
}

#[async_trait]
impl Tool for RecentBillsTool {
    fn name(&self) -> &str {
        RECENT_BILLS_TOOL
    }

    async fn call(&self, _arguments: &str) -> String {
        info!("Tool call: fetching {} recent bills", self.limit);
        let result = self.scraper.recent_bills(self.limit).await;
        if let Err(e) = &result {
            warn!("Recent bills tool failed: {}", e);
        }
        bills_tool_payload(&result)
    }
}

/// Tools by function name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in tools.
    pub fn with_defaults(scraper: Arc<CamaraScraper>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RecentBillsTool::new(scraper)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute one tool call. Unknown functions get an error payload so the
    /// run can still continue.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let output = match self.tools.get(&call.function.name) {
            Some(tool) => tool.call(&call.function.arguments).await,
            None => {
                warn!("Assistant requested unknown function '{}'", call.function.name);
                json!({ "error": format!("Función desconocida: {}", call.function.name) })
                    .to_string()
            }
        };

        ToolOutput {
            tool_call_id: call.id.clone(),
            output,
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::openai::FunctionCall;

    /// Tool that echoes its arguments.
    pub(crate) struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "eco"
        }

        async fn call(&self, arguments: &str) -> String {
            json!({ "recibido": arguments }).to_string()
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_execute_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.contains("eco"));

        let output = registry.execute(&call("call_1", "eco", "{\"x\":1}")).await;
        assert_eq!(output.tool_call_id, "call_1");
        let value: serde_json::Value = serde_json::from_str(&output.output).unwrap();
        assert_eq!(value["recibido"], "{\"x\":1}");
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_payload() {
        let registry = ToolRegistry::new();
        let output = registry.execute(&call("call_2", "borrar_todo", "{}")).await;
        let value: serde_json::Value = serde_json::from_str(&output.output).unwrap();
        assert!(value["error"].as_str().unwrap().contains("borrar_todo"));
    }

    #[test]
    fn test_defaults_register_recent_bills() {
        let scraper = CamaraScraper::new(crate::scrapers::ScraperConfig::base_default()).unwrap();
        let registry = ToolRegistry::with_defaults(Arc::new(scraper));
        assert_eq!(registry.names(), vec![RECENT_BILLS_TOOL.to_string()]);
    }
}
