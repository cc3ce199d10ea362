//! 行为结果模板渲染
//!
//! 模板按 行为类型 -> 状态码字符串 -> 模板文本 组织，
//! 支持 `{user_id}` `{item_id}` `{found_item_id}` `{cart}` `{id_to_remove}` 五个占位符，
//! 其他花括号内容原样保留。

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::actions::ActionType;
use crate::error::{FlowError, Result};

/// 结果模板表：行为类型 -> (状态码 -> 模板)
pub type ActionResults = BTreeMap<String, BTreeMap<String, String>>;

/// 空值在结果文本中的表示
const NONE_LITERAL: &str = "None";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("占位符正则表达式无效"));

/// 渲染一条结果文本所需的字段
#[derive(Debug, Clone, Copy)]
pub struct TemplateFields<'a> {
    pub user_id: &'a str,
    pub item_id: &'a str,
    pub found_item_id: Option<&'a str>,
    pub cart: &'a [Option<String>],
    pub id_to_remove: Option<&'a str>,
}

impl TemplateFields<'_> {
    /// 按占位符名称取值，未知占位符返回 None
    fn lookup(&self, name: &str) -> Option<String> {
        let value = match name {
            "user_id" => self.user_id.to_string(),
            "item_id" => self.item_id.to_string(),
            "found_item_id" => self.found_item_id.unwrap_or(NONE_LITERAL).to_string(),
            "cart" => render_cart(self.cart),
            "id_to_remove" => self.id_to_remove.unwrap_or(NONE_LITERAL).to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// 购物车渲染为列表字面量，例如 `['a', None]`
pub fn render_cart(cart: &[Option<String>]) -> String {
    let items: Vec<String> = cart
        .iter()
        .map(|id| match id {
            Some(id) => format!("'{}'", id),
            None => NONE_LITERAL.to_string(),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// 结果模板渲染器
#[derive(Debug, Clone)]
pub struct ResultRenderer {
    templates: ActionResults,
}

impl ResultRenderer {
    pub fn new(templates: ActionResults) -> Self {
        Self { templates }
    }

    /// 渲染结果文本，缺少模板时返回 `MissingTemplate`
    pub fn render(
        &self,
        action: ActionType,
        status: u16,
        fields: &TemplateFields<'_>,
    ) -> Result<String> {
        let template =
            self.template(action, status)
                .ok_or_else(|| FlowError::MissingTemplate {
                    action: action.to_string(),
                    status,
                })?;

        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            fields
                .lookup(&caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        });

        Ok(rendered.into_owned())
    }

    fn template(&self, action: ActionType, status: u16) -> Option<&str> {
        self.templates
            .get(action.as_str())
            .and_then(|by_status| by_status.get(&status.to_string()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> ResultRenderer {
        let templates: ActionResults = serde_json::from_value(json!({
            "log_in": {"200": "User {user_id} logged in."},
            "search_item": {"200": "Item {item_id} available."},
            "add_to_cart": {"200": "Add item {found_item_id} to cart."},
            "view_cart": {"200": "{cart}", "204": "{cart}"},
            "remove_from_cart": {"200": "Item {id_to_remove} removed from cart."},
            "pay": {"200": "Payment {unknown} ok {user_id}."}
        }))
        .unwrap();
        ResultRenderer::new(templates)
    }

    fn fields<'a>(cart: &'a [Option<String>]) -> TemplateFields<'a> {
        TemplateFields {
            user_id: "u1",
            item_id: "i1",
            found_item_id: None,
            cart,
            id_to_remove: None,
        }
    }

    #[test]
    fn test_render_user_id() {
        let r = renderer();
        let text = r.render(ActionType::LogIn, 200, &fields(&[])).unwrap();
        assert_eq!(text, "User u1 logged in.");
    }

    #[test]
    fn test_render_cart_literal() {
        let r = renderer();
        assert_eq!(
            r.render(ActionType::ViewCart, 204, &fields(&[])).unwrap(),
            "[]"
        );

        let cart = vec![Some("a".to_string()), Some("b".to_string())];
        assert_eq!(
            r.render(ActionType::ViewCart, 200, &fields(&cart)).unwrap(),
            "['a', 'b']"
        );

        let cart = vec![Some("a".to_string()), None];
        assert_eq!(
            r.render(ActionType::ViewCart, 200, &fields(&cart)).unwrap(),
            "['a', None]"
        );
    }

    #[test]
    fn test_render_optional_fields() {
        let r = renderer();

        // 未找到商品时渲染为 None
        let text = r.render(ActionType::AddToCart, 200, &fields(&[])).unwrap();
        assert_eq!(text, "Add item None to cart.");

        let mut f = fields(&[]);
        f.id_to_remove = Some("i9");
        let text = r.render(ActionType::RemoveFromCart, 200, &f).unwrap();
        assert_eq!(text, "Item i9 removed from cart.");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let r = renderer();
        let text = r.render(ActionType::Pay, 200, &fields(&[])).unwrap();
        assert_eq!(text, "Payment {unknown} ok u1.");
    }

    #[test]
    fn test_missing_template() {
        let r = renderer();

        let err = r.render(ActionType::Pay, 402, &fields(&[])).unwrap_err();
        assert!(matches!(
            err,
            FlowError::MissingTemplate { ref action, status: 402 } if action == "pay"
        ));

        let err = r.render(ActionType::LogOut, 200, &fields(&[])).unwrap_err();
        assert_eq!(err.code(), "MISSING_TEMPLATE");
    }
}
