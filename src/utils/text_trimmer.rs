use anyhow::{Result, bail};

use crate::utils::token_estimator::{MEAN_CHARS_PER_TOKEN, TokenEstimator};

/// 裁剪结果的最小字符数下限，低于该长度不再继续收缩
pub const MIN_CHUNK_CHARS: usize = 140;

/// 语义边界的优先级顺序：段落 → 换行 → 句子 → 单词
const BOUNDARIES: [&str; 5] = ["\n\n", "\n", ". ", "。", " "];

/// 文本裁剪器，保证送入prompt的内容不超过模型上下文的token预算
///
/// 在预算内的文本原样返回（幂等）。超出预算时按语义边界递归收缩，
/// 优先在较大的语义边界（段落）处切分，边界切分无法推进时退化为硬切。
#[derive(Clone)]
pub struct TextTrimmer {
    estimator: TokenEstimator,
}

impl Default for TextTrimmer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTrimmer {
    pub fn new() -> Self {
        Self {
            estimator: TokenEstimator::new(),
        }
    }

    /// 将文本裁剪到token预算以内
    ///
    /// 返回值满足：估算token数不超过`budget_tokens`，或长度已到达
    /// `MIN_CHUNK_CHARS`下限。预算必须为正数，否则快速失败。
    pub fn trim(&self, text: &str, budget_tokens: usize) -> Result<String> {
        if budget_tokens == 0 {
            bail!("token预算必须为正数");
        }

        let mut current = text.to_string();
        loop {
            if current.is_empty() {
                return Ok(current);
            }

            let tokens = self.estimator.estimate_tokens(&current);
            if tokens <= budget_tokens {
                return Ok(current);
            }

            let char_len = current.chars().count();
            if char_len <= MIN_CHUNK_CHARS {
                // 已到下限，即便仍超预算也不再收缩
                return Ok(current);
            }

            // 用平均每token字符数把超额token换算为目标字符长度
            let overflow = tokens - budget_tokens;
            let target = char_len
                .saturating_sub(overflow * MEAN_CHARS_PER_TOKEN)
                .max(MIN_CHUNK_CHARS);

            let candidate = first_chunk(&current, target);
            if candidate.chars().count() >= char_len {
                // 边界切分没有产生更短的结果，退化为硬切后继续
                current = hard_cut(&current, target);
            } else {
                current = candidate;
            }
        }
    }
}

/// 取出不超过目标长度的第一个语义块
///
/// 从最大的语义边界开始尝试；若第一段在该边界下就超过目标长度，
/// 则降级到更细的边界，最终退化为字符级硬切。
fn first_chunk(text: &str, target_chars: usize) -> String {
    for sep in BOUNDARIES {
        if !text.contains(sep) {
            continue;
        }

        let mut acc = String::new();
        let mut acc_chars = 0usize;
        for piece in text.split_inclusive(sep) {
            let piece_chars = piece.chars().count();
            if acc_chars + piece_chars > target_chars {
                break;
            }
            acc.push_str(piece);
            acc_chars += piece_chars;
        }

        if !acc.is_empty() {
            return acc;
        }
    }

    hard_cut(text, target_chars)
}

/// 字符级硬切，尊重UTF-8字符边界
fn hard_cut(text: &str, target_chars: usize) -> String {
    text.chars().take(target_chars).collect()
}
