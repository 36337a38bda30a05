//! In-memory implementation of every driven persistence port.
//!
//! Mirrors the semantics of the diesel adapters closely enough for
//! behavioural tests: unique constraints raise `Duplicate`, subscriptions
//! are soft-deleted, and cascades are applied atomically under one lock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BoardFirmwareQuery, BoardFirmwareQueryError, CityRepository, CityRepositoryError,
    CitySubscriptionRepository, CitySubscriptionRepositoryError, EventRegistrationRepository,
    EventRegistrationRepositoryError, EventRepository, EventRepositoryError,
    EventVisibilityRepository, EventVisibilityRepositoryError, MessageInteractionRepository,
    MessageInteractionRepositoryError, PushTokenRepository, PushTokenRepositoryError,
    UserDirectory, UserDirectoryError,
};
use crate::domain::{
    AdminEvent, BoardFirmwareNotice, City, CityId, CitySubscription, CitySubscriptionSummary,
    Event, EventCity, EventId, EventKey, EventRegistration, MessageState, MessageTarget,
    PushEndpoint, PushSubscription, PushToken, PushTokenId, StoredMessageState, User, UserEvent,
    UserId, sort_by_name,
};

#[derive(Debug, Clone)]
struct SubscriptionRow {
    user_id: UserId,
    city_id: CityId,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl SubscriptionRow {
    fn is_active_for(&self, user_id: &UserId, city_id: &CityId) -> bool {
        self.deleted_at.is_none() && self.user_id == *user_id && self.city_id == *city_id
    }
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    cities: HashMap<CityId, City>,
    subscriptions: Vec<SubscriptionRow>,
    events: HashMap<EventId, Event>,
    registrations: Vec<EventRegistration>,
    interactions: HashMap<(UserId, EventId), StoredMessageState>,
    push_tokens: Vec<PushToken>,
    push_subscriptions: Vec<PushSubscription>,
    boards: HashMap<UserId, Vec<BoardFirmwareNotice>>,
}

impl State {
    fn is_subscribed(&self, user_id: &UserId, city_id: &CityId) -> bool {
        self.subscriptions
            .iter()
            .any(|row| row.is_active_for(user_id, city_id))
    }

    fn registration(&self, user_id: &UserId, event_id: &EventId) -> Option<&EventRegistration> {
        self.registrations
            .iter()
            .find(|row| row.user_id == *user_id && row.event_id == *event_id)
    }

    fn event_city(&self, event: &Event) -> Option<&City> {
        event.city_id.and_then(|id| self.cities.get(&id))
    }

    fn user_event(
        &self,
        user_id: &UserId,
        event: &Event,
        cutoff: DateTime<Utc>,
    ) -> Option<UserEvent> {
        if event.end_date <= cutoff {
            return None;
        }
        let registration = self.registration(user_id, &event.id);
        let visible = match event.city_id {
            None => true,
            Some(city_id) => registration.is_some() || self.is_subscribed(user_id, &city_id),
        };
        if !visible {
            return None;
        }
        let city = self.event_city(event);
        Some(UserEvent {
            event: event.clone(),
            city: city.map(EventCity::from),
            image_url: event
                .image_url
                .clone()
                .or_else(|| city.and_then(|city| city.image_url.clone())),
            going: registration.map(|row| row.going),
            message_state: MessageState::from_stored(
                self.interactions.get(&(user_id.clone(), event.id)).copied(),
            ),
        })
    }

    fn admin_event(&self, event: &Event) -> AdminEvent {
        let answers = self
            .registrations
            .iter()
            .filter(|row| row.event_id == event.id);
        let attending = answers.clone().filter(|row| row.going).count();
        let rejected = answers.filter(|row| !row.going).count();
        let subscribers = match event.city_id {
            Some(city_id) => self
                .subscriptions
                .iter()
                .filter(|row| row.deleted_at.is_none() && row.city_id == city_id)
                .count(),
            None => self.users.len(),
        };
        AdminEvent {
            event: event.clone(),
            city: self.event_city(event).map(EventCity::from),
            attending_count: attending as u64,
            rejected_count: rejected as u64,
            subscriber_count: subscribers as u64,
        }
    }
}

/// Shared in-memory store implementing all persistence ports.
#[derive(Debug, Default)]
pub struct InMemoryStore(Mutex<State>);

impl InMemoryStore {
    fn state(&self) -> MutexGuard<'_, State> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory store mutex"),
        }
    }

    /// Seed a user record.
    pub fn add_user(&self, user: User) {
        self.state().users.insert(user.id.clone(), user);
    }

    /// Seed a city record directly, bypassing the registry.
    pub fn add_city(&self, city: City) {
        self.state().cities.insert(city.id, city);
    }

    /// Attach boards to a user.
    pub fn add_boards(&self, user_id: &UserId, boards: Vec<BoardFirmwareNotice>) {
        self.state().boards.insert(user_id.clone(), boards);
    }

    /// Number of subscription rows for a city, soft-deleted ones included.
    pub fn subscription_rows_for_city(&self, city_id: &CityId) -> usize {
        self.state()
            .subscriptions
            .iter()
            .filter(|row| row.city_id == *city_id)
            .count()
    }

    /// Stored interaction rows for a user.
    pub fn interaction_rows(&self, user_id: &UserId) -> Vec<(EventId, StoredMessageState)> {
        self.state()
            .interactions
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|((_, event_id), state)| (*event_id, *state))
            .collect()
    }

    /// Stored push token by id.
    pub fn push_token(&self, id: &PushTokenId) -> Option<PushToken> {
        self.state()
            .push_tokens
            .iter()
            .find(|token| token.id == *id)
            .cloned()
    }

    /// Registrations stored for an event.
    pub fn registrations_for(&self, event_id: &EventId) -> Vec<EventRegistration> {
        self.state()
            .registrations
            .iter()
            .filter(|row| row.event_id == *event_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError> {
        Ok(self.state().users.get(id).cloned())
    }
}

#[async_trait]
impl CityRepository for InMemoryStore {
    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError> {
        Ok(self.state().cities.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<City>, CityRepositoryError> {
        Ok(self
            .state()
            .cities
            .values()
            .find(|city| city.name == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<City>, CityRepositoryError> {
        let mut cities: Vec<_> = self.state().cities.values().cloned().collect();
        sort_by_name(&mut cities);
        Ok(cities)
    }

    async fn insert(&self, city: &City) -> Result<(), CityRepositoryError> {
        let mut state = self.state();
        if state.cities.values().any(|other| other.name == city.name) {
            return Err(CityRepositoryError::duplicate(city.name.clone()));
        }
        state.cities.insert(city.id, city.clone());
        Ok(())
    }

    async fn update(&self, city: &City) -> Result<(), CityRepositoryError> {
        let mut state = self.state();
        if state
            .cities
            .values()
            .any(|other| other.id != city.id && other.name == city.name)
        {
            return Err(CityRepositoryError::duplicate(city.name.clone()));
        }
        state.cities.insert(city.id, city.clone());
        Ok(())
    }

    async fn count_events(&self, id: &CityId) -> Result<u64, CityRepositoryError> {
        let count = self
            .state()
            .events
            .values()
            .filter(|event| event.city_id == Some(*id))
            .count();
        Ok(count as u64)
    }

    async fn delete_with_subscriptions(&self, id: &CityId) -> Result<(), CityRepositoryError> {
        let mut state = self.state();
        state.subscriptions.retain(|row| row.city_id != *id);
        state.cities.remove(id);
        Ok(())
    }
}

#[async_trait]
impl CitySubscriptionRepository for InMemoryStore {
    async fn find_active(
        &self,
        user_id: &UserId,
        city_id: &CityId,
    ) -> Result<Option<CitySubscription>, CitySubscriptionRepositoryError> {
        Ok(self
            .state()
            .subscriptions
            .iter()
            .find(|row| row.is_active_for(user_id, city_id))
            .map(|row| CitySubscription {
                user_id: row.user_id.clone(),
                city_id: row.city_id,
                created_at: row.created_at,
            }))
    }

    async fn subscribe(
        &self,
        subscription: &CitySubscription,
    ) -> Result<(), CitySubscriptionRepositoryError> {
        let mut state = self.state();
        let existing = state.subscriptions.iter_mut().find(|row| {
            row.user_id == subscription.user_id && row.city_id == subscription.city_id
        });
        match existing {
            Some(row) if row.deleted_at.is_none() => Err(
                CitySubscriptionRepositoryError::duplicate(subscription.city_id.to_string()),
            ),
            Some(row) => {
                row.deleted_at = None;
                row.created_at = subscription.created_at;
                Ok(())
            }
            None => {
                state.subscriptions.push(SubscriptionRow {
                    user_id: subscription.user_id.clone(),
                    city_id: subscription.city_id,
                    created_at: subscription.created_at,
                    deleted_at: None,
                });
                Ok(())
            }
        }
    }

    async fn unsubscribe(
        &self,
        user_id: &UserId,
        city_id: &CityId,
        at: DateTime<Utc>,
    ) -> Result<bool, CitySubscriptionRepositoryError> {
        let mut state = self.state();
        let row = state
            .subscriptions
            .iter_mut()
            .find(|row| row.is_active_for(user_id, city_id));
        Ok(row.map(|row| row.deleted_at = Some(at)).is_some())
    }

    async fn subscribed_cities(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<City>, CitySubscriptionRepositoryError> {
        let state = self.state();
        let mut cities: Vec<_> = state
            .subscriptions
            .iter()
            .filter(|row| row.deleted_at.is_none() && row.user_id == *user_id)
            .filter_map(|row| state.cities.get(&row.city_id).cloned())
            .collect();
        sort_by_name(&mut cities);
        Ok(cities)
    }

    async fn subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CitySubscription>, CitySubscriptionRepositoryError> {
        let state = self.state();
        let mut rows: Vec<_> = state
            .subscriptions
            .iter()
            .filter(|row| row.deleted_at.is_none() && row.user_id == *user_id)
            .filter_map(|row| {
                state.cities.get(&row.city_id).map(|city| {
                    (
                        city.name.clone(),
                        CitySubscription {
                            user_id: row.user_id.clone(),
                            city_id: row.city_id,
                            created_at: row.created_at,
                        },
                    )
                })
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn summaries(
        &self,
    ) -> Result<Vec<CitySubscriptionSummary>, CitySubscriptionRepositoryError> {
        let state = self.state();
        let mut cities: Vec<_> = state.cities.values().cloned().collect();
        sort_by_name(&mut cities);
        Ok(cities
            .into_iter()
            .map(|city| {
                let count = state
                    .subscriptions
                    .iter()
                    .filter(|row| row.deleted_at.is_none() && row.city_id == city.id)
                    .count();
                CitySubscriptionSummary {
                    city,
                    subscriber_count: count as u64,
                }
            })
            .collect())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventRepositoryError> {
        Ok(self.state().events.get(id).cloned())
    }

    async fn exists_with_key(
        &self,
        key: &EventKey,
        excluding: Option<EventId>,
    ) -> Result<bool, EventRepositoryError> {
        Ok(self
            .state()
            .events
            .values()
            .any(|event| Some(event.id) != excluding && event.key() == *key))
    }

    async fn insert(&self, event: &Event) -> Result<(), EventRepositoryError> {
        let mut state = self.state();
        if state.events.values().any(|other| other.key() == event.key()) {
            return Err(EventRepositoryError::duplicate(event.name.clone()));
        }
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<(), EventRepositoryError> {
        let mut state = self.state();
        if state
            .events
            .values()
            .any(|other| other.id != event.id && other.key() == event.key())
        {
            return Err(EventRepositoryError::duplicate(event.name.clone()));
        }
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn delete_cascade(&self, id: &EventId) -> Result<bool, EventRepositoryError> {
        let mut state = self.state();
        if !state.events.contains_key(id) {
            return Ok(false);
        }
        state.interactions.retain(|(_, event_id), _| event_id != id);
        state.registrations.retain(|row| row.event_id != *id);
        state.events.remove(id);
        Ok(true)
    }

    async fn list_admin(
        &self,
        city_id: Option<CityId>,
    ) -> Result<Vec<AdminEvent>, EventRepositoryError> {
        let state = self.state();
        let mut events: Vec<_> = state
            .events
            .values()
            .filter(|event| city_id.is_none() || event.city_id == city_id)
            .map(|event| state.admin_event(event))
            .collect();
        events.sort_by(|a, b| b.event.start_date.cmp(&a.event.start_date));
        Ok(events)
    }

    async fn find_admin(&self, id: &EventId) -> Result<Option<AdminEvent>, EventRepositoryError> {
        let state = self.state();
        Ok(state.events.get(id).map(|event| state.admin_event(event)))
    }
}

#[async_trait]
impl EventVisibilityRepository for InMemoryStore {
    async fn visible_events(
        &self,
        user_id: &UserId,
        ends_after: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, EventVisibilityRepositoryError> {
        let state = self.state();
        let mut events: Vec<_> = state
            .events
            .values()
            .filter_map(|event| state.user_event(user_id, event, ends_after))
            .collect();
        events.sort_by(|a, b| b.event.published_at.cmp(&a.event.published_at));
        Ok(events)
    }

    async fn visible_event(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        ends_after: DateTime<Utc>,
    ) -> Result<Option<UserEvent>, EventVisibilityRepositoryError> {
        let state = self.state();
        Ok(state
            .events
            .get(event_id)
            .and_then(|event| state.user_event(user_id, event, ends_after)))
    }
}

#[async_trait]
impl EventRegistrationRepository for InMemoryStore {
    async fn find(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<EventRegistration>, EventRegistrationRepositoryError> {
        Ok(self.state().registration(user_id, event_id).cloned())
    }

    async fn insert(
        &self,
        registration: &EventRegistration,
    ) -> Result<(), EventRegistrationRepositoryError> {
        let mut state = self.state();
        if state
            .registration(&registration.user_id, &registration.event_id)
            .is_some()
        {
            return Err(EventRegistrationRepositoryError::duplicate(
                registration.event_id.to_string(),
            ));
        }
        state.registrations.push(registration.clone());
        Ok(())
    }

    async fn update_going(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        going: bool,
    ) -> Result<bool, EventRegistrationRepositoryError> {
        let mut state = self.state();
        let row = state
            .registrations
            .iter_mut()
            .find(|row| row.user_id == *user_id && row.event_id == *event_id);
        Ok(row.map(|row| row.going = going).is_some())
    }
}

fn interaction_key(user_id: &UserId, target: &MessageTarget) -> (UserId, EventId) {
    match target {
        MessageTarget::Event { event_id } => (user_id.clone(), *event_id),
    }
}

#[async_trait]
impl MessageInteractionRepository for InMemoryStore {
    async fn find(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
    ) -> Result<Option<StoredMessageState>, MessageInteractionRepositoryError> {
        Ok(self
            .state()
            .interactions
            .get(&interaction_key(user_id, target))
            .copied())
    }

    async fn insert(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
        state: StoredMessageState,
    ) -> Result<(), MessageInteractionRepositoryError> {
        let key = interaction_key(user_id, target);
        let mut store = self.state();
        if store.interactions.contains_key(&key) {
            return Err(MessageInteractionRepositoryError::duplicate(key.1.to_string()));
        }
        store.interactions.insert(key, state);
        Ok(())
    }

    async fn update(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
        state: StoredMessageState,
    ) -> Result<u64, MessageInteractionRepositoryError> {
        let key = interaction_key(user_id, target);
        let mut store = self.state();
        Ok(store
            .interactions
            .get_mut(&key)
            .map_or(0, |stored| {
                *stored = state;
                1
            }))
    }
}

#[async_trait]
impl PushTokenRepository for InMemoryStore {
    async fn enabled_endpoints_for_city(
        &self,
        city_id: &CityId,
    ) -> Result<Vec<PushEndpoint>, PushTokenRepositoryError> {
        let state = self.state();
        Ok(state
            .push_tokens
            .iter()
            .filter(|token| token.enabled && state.is_subscribed(&token.user_id, city_id))
            .map(|token| PushEndpoint {
                token_id: token.id,
                endpoint_arn: token.endpoint_arn.clone(),
            })
            .collect())
    }

    async fn disable(&self, ids: &[PushTokenId]) -> Result<u64, PushTokenRepositoryError> {
        let mut state = self.state();
        let mut changed = 0;
        for token in state.push_tokens.iter_mut().filter(|t| ids.contains(&t.id)) {
            token.enabled = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PushToken>, PushTokenRepositoryError> {
        Ok(self
            .state()
            .push_tokens
            .iter()
            .find(|row| row.token == token)
            .cloned())
    }

    async fn find_by_id(
        &self,
        id: &PushTokenId,
    ) -> Result<Option<PushToken>, PushTokenRepositoryError> {
        Ok(self.push_token(id))
    }

    async fn insert(&self, token: &PushToken) -> Result<(), PushTokenRepositoryError> {
        let mut state = self.state();
        if state.push_tokens.iter().any(|row| row.token == token.token) {
            return Err(PushTokenRepositoryError::duplicate(token.token.clone()));
        }
        state.push_tokens.push(token.clone());
        Ok(())
    }

    async fn set_enabled(
        &self,
        id: &PushTokenId,
        enabled: bool,
    ) -> Result<(), PushTokenRepositoryError> {
        if let Some(token) = self.state().push_tokens.iter_mut().find(|t| t.id == *id) {
            token.enabled = enabled;
        }
        Ok(())
    }

    async fn add_subscription(
        &self,
        subscription: &PushSubscription,
    ) -> Result<(), PushTokenRepositoryError> {
        self.state().push_subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn subscriptions_for_token(
        &self,
        id: &PushTokenId,
    ) -> Result<Vec<PushSubscription>, PushTokenRepositoryError> {
        Ok(self
            .state()
            .push_subscriptions
            .iter()
            .filter(|row| row.push_token_id == *id)
            .cloned()
            .collect())
    }

    async fn delete_with_subscriptions(
        &self,
        id: &PushTokenId,
    ) -> Result<(), PushTokenRepositoryError> {
        let mut state = self.state();
        state.push_subscriptions.retain(|row| row.push_token_id != *id);
        state.push_tokens.retain(|row| row.id != *id);
        Ok(())
    }
}

#[async_trait]
impl BoardFirmwareQuery for InMemoryStore {
    async fn outdated_boards(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<BoardFirmwareNotice>, BoardFirmwareQueryError> {
        Ok(self
            .state()
            .boards
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
