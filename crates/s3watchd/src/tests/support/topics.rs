//! [`TopicLookup`] double with a fixed answer for whole-run tests.

use async_trait::async_trait;

use crate::queue::BoxError;
use crate::topic::TopicLookup;

#[derive(Debug)]
pub struct StubTopicLookup {
    response: Result<Vec<String>, String>,
}

impl StubTopicLookup {
    pub fn with_topics(topics: &[&str]) -> Self {
        Self {
            response: Ok(topics.iter().map(|topic| (*topic).to_owned()).collect()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_owned()),
        }
    }
}

#[async_trait]
impl TopicLookup for StubTopicLookup {
    async fn topic_arns(&self, _bucket: &str) -> Result<Vec<String>, BoxError> {
        self.response.clone().map_err(BoxError::from)
    }
}
