use serde::{Deserialize, Serialize};

/// Token估算器，用于估算文本的token数量
///
/// 估算是确定性的：相同文本永远得到相同结果，这是裁剪算法收敛的前提。
#[derive(Clone)]
pub struct TokenEstimator {
    /// 不同字符类别的token计算规则
    rules: TokenCalculationRules,
}

/// Token计算规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCalculationRules {
    /// 英文字符的平均token比例（字符数/token数）
    pub english_char_per_token: f64,
    /// 中文字符的平均token比例
    pub chinese_char_per_token: f64,
}

impl Default for TokenCalculationRules {
    fn default() -> Self {
        Self {
            // 基于GPT系列模型的经验值
            english_char_per_token: 4.0,
            chinese_char_per_token: 1.5,
        }
    }
}

/// 混合文本的平均每token字符数，用于从token超额量换算目标字符长度
pub const MEAN_CHARS_PER_TOKEN: usize = 3;

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self {
            rules: TokenCalculationRules::default(),
        }
    }

    /// 估算文本的token数量
    pub fn estimate_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let character_count = text.chars().count();
        let chinese_char_count = self.count_chinese_chars(text);
        let other_char_count = character_count - chinese_char_count;

        let chinese_tokens =
            (chinese_char_count as f64 / self.rules.chinese_char_per_token).ceil() as usize;
        // 非中文字符统一按英文规则计算
        let other_tokens =
            (other_char_count as f64 / self.rules.english_char_per_token).ceil() as usize;

        chinese_tokens + other_tokens
    }

    /// 检查文本是否超过token限制
    pub fn exceeds_limit(&self, text: &str, limit: usize) -> bool {
        self.estimate_tokens(text) > limit
    }

    /// 计算中文字符数量
    fn count_chinese_chars(&self, text: &str) -> usize {
        text.chars().filter(|c| self.is_chinese_char(*c)).count()
    }

    /// 判断是否为中文字符
    fn is_chinese_char(&self, c: char) -> bool {
        matches!(c as u32,
            0x4E00..=0x9FFF |  // CJK统一汉字
            0x3400..=0x4DBF |  // CJK扩展A
            0x20000..=0x2A6DF | // CJK扩展B
            0x2A700..=0x2B73F | // CJK扩展C
            0x2B740..=0x2B81F | // CJK扩展D
            0x2B820..=0x2CEAF | // CJK扩展E
            0x2CEB0..=0x2EBEF | // CJK扩展F
            0x30000..=0x3134F   // CJK扩展G
        )
    }
}
