//! 网关能力发现：列出后按白名单筛选，保持网关给出的顺序

use crate::gateway::{GatewayError, Prompt, Resource, ToolGateway};
use crate::tools::ToolDefinition;

/// 白名单为空表示全部保留
fn allowed(allow: &[String], name: &str) -> bool {
    allow.is_empty() || allow.iter().any(|a| a == name)
}

/// 列出远程工具并转换为 ToolDefinition
pub async fn discover_tools(
    gateway: &dyn ToolGateway,
    allow: &[String],
) -> Result<Vec<ToolDefinition>, GatewayError> {
    let listed = gateway.list_tools().await?;
    let total = listed.len();
    let defs: Vec<ToolDefinition> = listed
        .iter()
        .filter(|t| allowed(allow, &t.name))
        .map(|t| t.to_definition())
        .collect();
    tracing::info!(total, kept = defs.len(), "gateway tools discovered");
    Ok(defs)
}

/// 按资源名筛选
pub async fn discover_resources(
    gateway: &dyn ToolGateway,
    allow: &[String],
) -> Result<Vec<Resource>, GatewayError> {
    let resources: Vec<Resource> = gateway
        .list_resources()
        .await?
        .into_iter()
        .filter(|r| allowed(allow, &r.name))
        .collect();
    tracing::info!(kept = resources.len(), "gateway resources discovered");
    Ok(resources)
}

pub async fn discover_prompts(
    gateway: &dyn ToolGateway,
    allow: &[String],
) -> Result<Vec<Prompt>, GatewayError> {
    let prompts: Vec<Prompt> = gateway
        .list_prompts()
        .await?
        .into_iter()
        .filter(|p| allowed(allow, &p.name))
        .collect();
    tracing::info!(kept = prompts.len(), "gateway prompts discovered");
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayTool, ScriptedGateway};
    use serde_json::json;

    fn gateway() -> ScriptedGateway {
        let tool = |name: &str| GatewayTool {
            name: name.to_string(),
            description: Some(format!("{name} tool")),
            input_schema: json!({"type": "object", "properties": {"x": {"type": "string"}}, "required": ["x"]}),
        };
        ScriptedGateway::new()
            .with_tools(vec![tool("fetch"), tool("add"), tool("search")])
            .with_resources(vec![
                Resource {
                    uri: "config:///a".into(),
                    name: "a".into(),
                    description: None,
                    mime_type: None,
                },
                Resource {
                    uri: "config:///b".into(),
                    name: "b".into(),
                    description: None,
                    mime_type: None,
                },
            ])
    }

    #[tokio::test]
    async fn test_empty_allow_list_keeps_all_in_order() {
        let defs = discover_tools(&gateway(), &[]).await.unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fetch", "add", "search"]);
        assert_eq!(defs[0].parameters["type"], "object");
        assert_eq!(defs[0].required_fields(), vec!["x"]);
    }

    #[tokio::test]
    async fn test_allow_list_keeps_gateway_order() {
        let allow = vec!["search".to_string(), "fetch".to_string(), "missing".to_string()];
        let defs = discover_tools(&gateway(), &allow).await.unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fetch", "search"]);
    }

    #[tokio::test]
    async fn test_resources_filtered_by_name() {
        let resources = discover_resources(&gateway(), &["b".to_string()]).await.unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri, "config:///b");
        assert!(discover_prompts(&gateway(), &[]).await.unwrap().is_empty());
    }
}
