pub mod rate_limiter;
pub mod text_trimmer;
pub mod token_estimator;
