use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::{DEFAULT_REGEX_SIZE_LIMIT, MatchOptions, MatchStrategy};
use crate::table::DuplicatePolicy;
use crate::tree::ForestOptions;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RouterOptions {
    pub strategy: MatchStrategy,
    pub duplicate_policy: DuplicatePolicy,
    pub case_sensitive: bool,
    /// Percent-decode path parameter values after matching.
    pub decode_params: bool,
    /// Reject (500) JSON responses that fail a declared response contract.
    pub validate_responses: bool,
    /// Compiled size limit for the composed expression of the dynamic
    /// strategy.
    pub regex_size_limit: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            case_sensitive: true,
            decode_params: true,
            validate_responses: false,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

impl RouterOptions {
    pub fn builder() -> RouterOptionsBuilder {
        RouterOptionsBuilder::default()
    }

    pub fn validate(&self) -> Result<(), RouterOptionsError> {
        if self.regex_size_limit == 0 {
            return Err(RouterOptionsError::RegexSizeLimitInvalid {
                provided: self.regex_size_limit,
            });
        }
        Ok(())
    }

    pub fn forest_options(&self) -> ForestOptions {
        ForestOptions {
            duplicate_policy: self.duplicate_policy,
            case_sensitive: self.case_sensitive,
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
            decode_params: self.decode_params,
            regex_size_limit: self.regex_size_limit,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RouterOptionsBuilder {
    options: RouterOptions,
}

impl RouterOptionsBuilder {
    pub fn strategy(mut self, value: MatchStrategy) -> Self {
        self.options.strategy = value;
        self
    }

    pub fn duplicate_policy(mut self, value: DuplicatePolicy) -> Self {
        self.options.duplicate_policy = value;
        self
    }

    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.options.case_sensitive = value;
        self
    }

    pub fn decode_params(mut self, value: bool) -> Self {
        self.options.decode_params = value;
        self
    }

    pub fn validate_responses(mut self, value: bool) -> Self {
        self.options.validate_responses = value;
        self
    }

    pub fn regex_size_limit(mut self, value: usize) -> Self {
        self.options.regex_size_limit = value;
        self
    }

    pub fn build(self) -> Result<RouterOptions, RouterOptionsError> {
        let options = self.options;
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterOptionsError {
    #[error("regex_size_limit must be at least 1 byte (got {provided})")]
    RegexSizeLimitInvalid { provided: usize },
}
