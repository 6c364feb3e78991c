use thiserror::Error;

/// 研究工作流的领域错误
///
/// 与协作方的传输层错误（anyhow）区分开：这里的变体都带有明确的
/// 工作流语义，编排器据此决定传播还是在分支边界吸收。
#[derive(Debug, Error)]
pub enum ResearchError {
    /// 模型输出无法解析或通过结构校验
    #[error("模型输出不符合预期结构: {reason}")]
    MalformedModelOutput {
        reason: String,
        /// 原始响应文本，用于诊断
        raw: String,
    },

    /// 规划器产出了查询文本为空的子查询
    #[error("子查询缺少查询文本")]
    InvalidSubQuery,

    /// 搜索调用失败（传输错误或超时）
    #[error("搜索调用失败: {0}")]
    SearchFailure(String),

    /// 模型补全调用失败（重试耗尽后）
    #[error("模型调用失败: {0}")]
    CompletionFailure(String),
}

/// 诊断信息里原始响应的展示长度上限
const RAW_PREVIEW_CHARS: usize = 512;

impl ResearchError {
    /// 生成带原始响应片段的诊断信息
    pub fn diagnostic(&self) -> String {
        match self {
            ResearchError::MalformedModelOutput { reason, raw } => {
                let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
                let ellipsis = if raw.chars().count() > RAW_PREVIEW_CHARS {
                    "…"
                } else {
                    ""
                };
                format!(
                    "模型输出不符合预期结构: {}\n原始输出片段:\n{}{}",
                    reason, preview, ellipsis
                )
            }
            other => other.to_string(),
        }
    }
}
