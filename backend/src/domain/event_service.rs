//! Event registry service.
//!
//! Owns the event lifecycle. Every registration, and every update that moves
//! an event to a different city, is handed to the [`EventNotifier`] once the
//! row is committed. Notification failures are logged and never turn a
//! committed write into a failed request.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info};

use super::service_errors::{map_city_error, map_event_error};
use crate::domain::ports::{
    CityRepository, EventCommand, EventNotifier, EventQuery, EventRepository,
};
use crate::domain::{
    AdminEvent, City, CityId, Error, Event, EventCity, EventId, EventPatch, EventPublication,
    NewEvent, effective_image_url, validate_window,
};

/// Options the registry reads at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRegistryConfig {
    /// Image used when neither the event nor its city has one.
    pub image_fallback_url: String,
}

/// Event registry implementing the event driving ports.
#[derive(Clone)]
pub struct EventRegistryService<E, C, N> {
    events: Arc<E>,
    cities: Arc<C>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: EventRegistryConfig,
}

impl<E, C, N> EventRegistryService<E, C, N> {
    /// Create the service.
    pub fn new(
        events: Arc<E>,
        cities: Arc<C>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        config: EventRegistryConfig,
    ) -> Self {
        Self {
            events,
            cities,
            notifier,
            clock,
            config,
        }
    }

    fn publication(&self, event: Event, city: Option<&City>) -> EventPublication {
        let image_url = effective_image_url(
            event.image_url.as_deref(),
            city.and_then(|city| city.image_url.as_deref()),
            &self.config.image_fallback_url,
        );
        EventPublication {
            event,
            city: city.map(EventCity::from),
            image_url,
        }
    }
}

impl<E, C, N> EventRegistryService<E, C, N>
where
    E: EventRepository,
    C: CityRepository,
    N: EventNotifier,
{
    async fn require_city(&self, id: &CityId) -> Result<City, Error> {
        self.cities
            .find_by_id(id)
            .await
            .map_err(map_city_error)?
            .ok_or_else(|| Error::not_found(format!("city {id} not found")))
    }

    async fn resolve_city(&self, id: Option<&CityId>) -> Result<Option<City>, Error> {
        match id {
            Some(id) => self.require_city(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn ensure_unique(&self, event: &Event, excluding: Option<EventId>) -> Result<(), Error> {
        let taken = self
            .events
            .exists_with_key(&event.key(), excluding)
            .await
            .map_err(map_event_error)?;
        if taken {
            return Err(Error::conflict(
                "an event with the same name, dates and city already exists",
            ));
        }
        Ok(())
    }

    async fn announce(&self, publication: &EventPublication) {
        if let Err(err) = self.notifier.event_published(publication).await {
            error!(
                event_id = %publication.event.id,
                trace_id = err.trace_id().unwrap_or_default(),
                code = ?err.code(),
                message = %err.message(),
                "event notification failed"
            );
        }
    }

    async fn admin_listing(&self, city_id: Option<CityId>) -> Result<Vec<AdminEvent>, Error> {
        self.events.list_admin(city_id).await.map_err(map_event_error)
    }
}

#[async_trait]
impl<E, C, N> EventCommand for EventRegistryService<E, C, N>
where
    E: EventRepository,
    C: CityRepository,
    N: EventNotifier,
{
    async fn register(&self, event: NewEvent) -> Result<Vec<AdminEvent>, Error> {
        let city = self.resolve_city(event.city_id.as_ref()).await?;
        let now = self.clock.utc();
        validate_window(event.start_date, event.end_date, now, true)?;
        let event = event.into_event(now);
        self.ensure_unique(&event, None).await?;
        self.events.insert(&event).await.map_err(map_event_error)?;
        info!(event_id = %event.id, city_id = ?event.city_id, "event registered");

        let publication = self.publication(event, city.as_ref());
        self.announce(&publication).await;
        self.admin_listing(None).await
    }

    async fn update(&self, id: &EventId, mut patch: EventPatch) -> Result<AdminEvent, Error> {
        let current = self
            .events
            .find_by_id(id)
            .await
            .map_err(map_event_error)?
            .ok_or_else(|| Error::not_found(format!("event {id} not found")))?;
        let now = self.clock.utc();
        let (start_date, end_date) = patch.effective_window(&current);
        validate_window(start_date, end_date, now, true)?;

        let city_change = patch.city_id.take();
        let republish_city = match city_change {
            Some(new_city) if new_city == current.city_id => {
                return Err(Error::invalid_request(
                    "event is already assigned to this city",
                )
                .with_details(json!({ "field": "cityId", "code": "city_unchanged" })));
            }
            Some(new_city) => Some(self.resolve_city(new_city.as_ref()).await?),
            None => None,
        };

        let mut updated = patch.apply(current, now);
        if let Some(city) = &republish_city {
            updated.city_id = city.as_ref().map(|city| city.id);
            updated.published_at = now;
        }
        self.ensure_unique(&updated, Some(*id)).await?;
        self.events.update(&updated).await.map_err(map_event_error)?;
        info!(event_id = %id, republish = republish_city.is_some(), "event updated");

        if let Some(city) = republish_city {
            let publication = self.publication(updated, city.as_ref());
            self.announce(&publication).await;
        }
        self.get_by_id(id).await
    }

    async fn remove(&self, id: &EventId) -> Result<Vec<AdminEvent>, Error> {
        let removed = self
            .events
            .delete_cascade(id)
            .await
            .map_err(map_event_error)?;
        if !removed {
            return Err(Error::not_found(format!("event {id} not found")));
        }
        info!(event_id = %id, "event removed");
        self.admin_listing(None).await
    }
}

#[async_trait]
impl<E, C, N> EventQuery for EventRegistryService<E, C, N>
where
    E: EventRepository,
    C: CityRepository,
    N: EventNotifier,
{
    async fn get_all(&self) -> Result<Vec<AdminEvent>, Error> {
        self.admin_listing(None).await
    }

    async fn get_all_in_city(&self, city_id: &CityId) -> Result<Vec<AdminEvent>, Error> {
        self.admin_listing(Some(*city_id)).await
    }

    async fn find_by_id(&self, id: &EventId) -> Result<Option<AdminEvent>, Error> {
        self.events.find_admin(id).await.map_err(map_event_error)
    }

    async fn get_by_id(&self, id: &EventId) -> Result<AdminEvent, Error> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("event {id} not found")))
    }
}

#[cfg(test)]
#[path = "event_service_tests.rs"]
mod tests;
