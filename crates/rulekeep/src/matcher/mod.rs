mod evaluator;

pub use evaluator::RuleMatcher;
