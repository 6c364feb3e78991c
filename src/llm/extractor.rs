//! 结构化输出提取 - 把模型的自由文本转换为经过校验的结构化数据
//!
//! 两阶段流水线：先定位候选JSON子串（优先取第一个```json围栏代码块，
//! 否则取整段文本），再经过清洗、解析、类型校验产出目标类型。
//! 任一阶段失败都会返回携带原始文本的`MalformedModelOutput`，便于诊断。

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::ResearchError;

/// 第一个标注为json的围栏代码块
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("固定正则必然合法"));

/// 闭合括号前的尾随逗号（模型输出的常见瑕疵）
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("固定正则必然合法"));

/// 从模型响应文本中提取结构化数据
pub fn extract_structured<T>(response: &str) -> Result<T, ResearchError>
where
    T: DeserializeOwned,
{
    let candidate = locate_candidate(response);
    let sanitized = sanitize(candidate);

    let value: serde_json::Value =
        serde_json::from_str(&sanitized).map_err(|e| ResearchError::MalformedModelOutput {
            reason: format!("JSON解析失败: {}", e),
            raw: response.to_string(),
        })?;

    serde_json::from_value(value).map_err(|e| ResearchError::MalformedModelOutput {
        reason: format!("结构校验失败: {}", e),
        raw: response.to_string(),
    })
}

/// 定位候选JSON子串：第一个```json围栏代码块的内部文本，否则整段响应
pub fn locate_candidate(response: &str) -> &str {
    if let Some(captures) = FENCED_JSON.captures(response)
        && let Some(inner) = captures.get(1)
    {
        return inner.as_str().trim();
    }
    response.trim()
}

/// 清洗候选文本：剔除可打印范围以下的控制字符与DEL，移除闭合括号前的尾随逗号
pub fn sanitize(candidate: &str) -> String {
    let without_control: String = candidate
        .chars()
        .filter(|c| !matches!(*c, '\u{0000}'..='\u{001F}' | '\u{007F}'))
        .collect();

    TRAILING_COMMA
        .replace_all(&without_control, "$1")
        .into_owned()
}
