//! Push gateway double that records every call.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{PushGateway, PushGatewayError};
use crate::domain::{
    EndpointArn, PlatformApplicationArn, PublishRequest, SubscriptionArn, TopicArn,
};

#[derive(Debug, Default)]
struct Journal {
    published: Vec<PublishRequest>,
    subscribed: Vec<(TopicArn, EndpointArn)>,
    unsubscribed: Vec<SubscriptionArn>,
    enabled: Vec<EndpointArn>,
    dead: HashSet<EndpointArn>,
    next_id: u32,
}

/// Gateway double. Endpoints marked dead answer publishes with
/// [`PushGatewayError::EndpointDisabled`].
#[derive(Debug, Default)]
pub struct RecordingPushGateway(Mutex<Journal>);

impl RecordingPushGateway {
    fn journal(&self) -> MutexGuard<'_, Journal> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("push journal mutex"),
        }
    }

    /// Make publishes to `endpoint` fail as disabled.
    pub fn mark_dead(&self, endpoint: &EndpointArn) {
        self.journal().dead.insert(endpoint.clone());
    }

    /// Every accepted or rejected publish, in call order.
    pub fn published(&self) -> Vec<PublishRequest> {
        self.journal().published.clone()
    }

    /// Publishes addressed to the topic.
    pub fn topic_publishes(&self) -> usize {
        self.journal()
            .published
            .iter()
            .filter(|request| request.topic_arn().is_some())
            .count()
    }

    /// Endpoints that received a targeted publish.
    pub fn targets(&self) -> Vec<EndpointArn> {
        self.journal()
            .published
            .iter()
            .filter_map(|request| request.target_arn().cloned())
            .collect()
    }

    /// Subscriptions removed so far.
    pub fn unsubscribed(&self) -> Vec<SubscriptionArn> {
        self.journal().unsubscribed.clone()
    }

    /// Topic subscriptions created so far.
    pub fn subscribed(&self) -> Vec<(TopicArn, EndpointArn)> {
        self.journal().subscribed.clone()
    }

    /// Endpoints re-enabled so far.
    pub fn enabled(&self) -> Vec<EndpointArn> {
        self.journal().enabled.clone()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn create_platform_endpoint(
        &self,
        application: &PlatformApplicationArn,
        token: &str,
    ) -> Result<EndpointArn, PushGatewayError> {
        Ok(EndpointArn::new(format!("{application}/endpoint/{token}")))
    }

    async fn subscribe(
        &self,
        topic: &TopicArn,
        endpoint: &EndpointArn,
    ) -> Result<SubscriptionArn, PushGatewayError> {
        let mut journal = self.journal();
        journal.next_id += 1;
        let arn = SubscriptionArn::new(format!("{topic}:sub-{}", journal.next_id));
        journal.subscribed.push((topic.clone(), endpoint.clone()));
        Ok(arn)
    }

    async fn unsubscribe(&self, subscription: &SubscriptionArn) -> Result<(), PushGatewayError> {
        self.journal().unsubscribed.push(subscription.clone());
        Ok(())
    }

    async fn publish(&self, request: &PublishRequest) -> Result<(), PushGatewayError> {
        let mut journal = self.journal();
        journal.published.push(request.clone());
        match request.target_arn() {
            Some(target) if journal.dead.contains(target) => {
                Err(PushGatewayError::endpoint_disabled(target.as_str()))
            }
            _ => Ok(()),
        }
    }

    async fn set_endpoint_enabled(
        &self,
        endpoint: &EndpointArn,
        enabled: bool,
    ) -> Result<(), PushGatewayError> {
        let mut journal = self.journal();
        if enabled {
            journal.dead.remove(endpoint);
            journal.enabled.push(endpoint.clone());
        }
        Ok(())
    }
}
