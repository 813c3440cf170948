use crate::bookings::BookingRepository;
use crate::error::{BookingError, EventError, HubError};
use crate::events::EventRepository;
use crate::slug::unique_slug;
use crate::store::Store;
use crate::types::{
    Booking, BookingId, CreateBookingInput, CreateEventInput, Event, EventFields, EventId,
    UpdateEventInput,
};
use crate::validation::{
    ValidEventFields, normalize_email, parse_event_id, validate_event_fields, validate_image,
};
use chrono::Utc;
use tracing::{debug, info, warn};

pub struct EventHub<S: Store> {
    store: S,
}

impl<S: Store> EventHub<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn bookings(&self) -> BookingsApi<'_, S> {
        BookingsApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a EventHub<S>,
}

impl<S: Store> EventsApi<'_, S> {
    pub fn create(&self, input: CreateEventInput) -> Result<Event, HubError> {
        let fields = validate_event_fields(input.fields)?;
        let image = validate_image(&input.image)?;
        let id = EventId::generate();
        let now = Utc::now();

        let event = self.core.store.with_tx(|store| {
            let slug = unique_slug(&store.events(), &fields.title, &id)?;
            let event = assemble(id.clone(), slug, image, fields, now, now);
            store.events().insert(&event)?;
            Ok(event)
        })?;
        info!(event_id = %event.id, slug = %event.slug, "event created");
        Ok(event)
    }

    /// Applies a partial update to the event at `slug`. The slug is only
    /// recomputed when the title actually changes.
    pub fn update(&self, slug: &str, input: UpdateEventInput) -> Result<Event, HubError> {
        let slug = normalize_slug_param(slug)?;
        let event = self.core.store.with_tx(|store| {
            let Some(existing) = store.events().get_by_slug(&slug)? else {
                return Err(HubError::Event(EventError::NotFound));
            };
            let (fields, image) = merge(&existing, input);
            let fields = validate_event_fields(fields)?;
            let image = validate_image(&image)?;

            let slug = if fields.title == existing.title {
                existing.slug.clone()
            } else {
                unique_slug(&store.events(), &fields.title, &existing.id)?
            };
            let event = assemble(
                existing.id.clone(),
                slug,
                image,
                fields,
                existing.created_at,
                Utc::now(),
            );
            store.events().update(&event)?;
            Ok(event)
        })?;
        info!(event_id = %event.id, slug = %event.slug, "event updated");
        Ok(event)
    }

    pub fn get(&self, id: &EventId) -> Result<Option<Event>, HubError> {
        self.core.store.events().get(id).map_err(HubError::from)
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Event>, HubError> {
        let slug = normalize_slug_param(slug)?;
        self.core
            .store
            .events()
            .get_by_slug(&slug)
            .map_err(HubError::from)
    }

    pub fn list(&self) -> Result<Vec<Event>, HubError> {
        self.core.store.events().list().map_err(HubError::from)
    }

    /// Events sharing at least one tag with the event at `slug`. Any failure,
    /// including an unknown slug, yields an empty list.
    pub fn similar(&self, slug: &str) -> Vec<Event> {
        let slug = slug.trim().to_lowercase();
        let events = self.core.store.events();
        let source = match events.get_by_slug(&slug) {
            Ok(Some(source)) => source,
            Ok(None) => {
                warn!(%slug, "similar events requested for unknown slug");
                return Vec::new();
            }
            Err(err) => {
                warn!(%slug, error = %err, "similar events lookup failed");
                return Vec::new();
            }
        };
        if source.tags.is_empty() {
            return Vec::new();
        }
        debug!(%slug, tags = ?source.tags, "finding similar events");
        match events.list_sharing_tags(&source.tags, &source.id) {
            Ok(similar) => {
                debug!(%slug, count = similar.len(), "found similar events");
                similar
            }
            Err(err) => {
                warn!(%slug, error = %err, "similar events query failed");
                Vec::new()
            }
        }
    }
}

pub struct BookingsApi<'a, S: Store> {
    core: &'a EventHub<S>,
}

impl<S: Store> BookingsApi<'_, S> {
    pub fn create(&self, input: CreateBookingInput) -> Result<Booking, HubError> {
        let email = normalize_email(&input.email)?;
        let event_id = parse_event_id(&input.event_id)?;

        let booking = self.core.store.with_tx(|store| {
            let exists = store
                .events()
                .get(&event_id)
                .map_err(|err| BookingError::Storage {
                    message: format!("error validating event reference: {err}"),
                })?
                .is_some();
            if !exists {
                return Err(HubError::Booking(BookingError::EventNotFound {
                    event_id: event_id.to_string(),
                }));
            }
            let now = Utc::now();
            let booking = Booking {
                id: BookingId::generate(),
                event_id: event_id.clone(),
                email,
                created_at: now,
                updated_at: now,
            };
            store.bookings().insert(&booking)?;
            Ok(booking)
        })?;
        info!(booking_id = %booking.id, event_id = %booking.event_id, "booking created");
        Ok(booking)
    }

    pub fn count_for_event(&self, event_id: &EventId) -> Result<u32, HubError> {
        self.core
            .store
            .bookings()
            .count_for_event(event_id)
            .map_err(HubError::from)
    }

    pub fn list_for_event(&self, event_id: &EventId) -> Result<Vec<Booking>, HubError> {
        self.core
            .store
            .bookings()
            .list_for_event(event_id)
            .map_err(HubError::from)
    }
}

fn normalize_slug_param(slug: &str) -> Result<String, HubError> {
    let slug = slug.trim().to_lowercase();
    if slug.is_empty() {
        return Err(HubError::Event(EventError::InvalidInput {
            message: "Slug cannot be empty".to_string(),
        }));
    }
    Ok(slug)
}

fn merge(existing: &Event, input: UpdateEventInput) -> (EventFields, String) {
    let fields = EventFields {
        title: input.title.unwrap_or_else(|| existing.title.clone()),
        description: input
            .description
            .unwrap_or_else(|| existing.description.clone()),
        overview: input.overview.unwrap_or_else(|| existing.overview.clone()),
        venue: input.venue.unwrap_or_else(|| existing.venue.clone()),
        location: input.location.unwrap_or_else(|| existing.location.clone()),
        date: input.date.unwrap_or_else(|| existing.date.to_string()),
        time: input.time.unwrap_or_else(|| existing.time.clone()),
        mode: input.mode.unwrap_or_else(|| existing.mode.to_string()),
        audience: input.audience.unwrap_or_else(|| existing.audience.clone()),
        agenda: input.agenda.unwrap_or_else(|| existing.agenda.clone()),
        organizer: input.organizer.unwrap_or_else(|| existing.organizer.clone()),
        tags: input.tags.unwrap_or_else(|| existing.tags.clone()),
    };
    let image = input.image.unwrap_or_else(|| existing.image.clone());
    (fields, image)
}

fn assemble(
    id: EventId,
    slug: String,
    image: String,
    fields: ValidEventFields,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> Event {
    Event {
        id,
        title: fields.title,
        slug,
        description: fields.description,
        overview: fields.overview,
        image,
        venue: fields.venue,
        location: fields.location,
        date: fields.date,
        time: fields.time,
        mode: fields.mode,
        audience: fields.audience,
        agenda: fields.agenda,
        organizer: fields.organizer,
        tags: fields.tags,
        created_at,
        updated_at,
    }
}
