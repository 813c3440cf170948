//! Server-rendered pages: the catalog, event details and the booking form.

use crate::routes::bookings::book;
use crate::{AppState, build_hub};
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use eh_core::HubError;
use eh_core::error::EventError;
use eh_core::types::{CreateBookingInput, Event};
use serde::Deserialize;
use std::fmt::Write as _;
use tracing::{error, warn};

#[derive(Debug, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub email: String,
}

enum Notice {
    Idle,
    Booked,
    Failed(String),
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/events/{slug}", get(event_page))
        .route("/events/{slug}/book", post(book_page))
        .with_state(state)
}

async fn home(State(state): State<AppState>) -> Response {
    let events = match build_hub(&state).await {
        Ok(hub) => hub.events().list(),
        Err(err) => Err(err),
    };

    let mut body = String::from(
        r##"<section>
<h1 class="text-center">The Hub for Every Dev <br> Event You Can't Miss</h1>
<p class="text-center subheading">Hackathons, Meetups, and Conferences, All in one Place!</p>
<a id="explore-btn" href="#events">Explore Events</a>
<div id="events">
<h3>Featured Events</h3>
"##,
    );
    match events {
        Ok(events) if events.is_empty() => {
            body.push_str(r#"<ul class="events"><li class="text-center">No events available yet</li></ul>"#);
        }
        Ok(events) => body.push_str(&event_cards(&events)),
        Err(err) => {
            error!(error = %err, "failed to load featured events");
            body.push_str(
                r#"<p class="notice error">Failed to load events. Please try again later.</p>"#,
            );
        }
    }
    body.push_str("</div>\n</section>");
    Html(layout("DevEvent", &body)).into_response()
}

async fn event_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match load_event(&state, &slug).await {
        Some(event) => render_event(&state, &event, &Notice::Idle, StatusCode::OK).await,
        None => not_found(),
    }
}

async fn book_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<BookingForm>,
) -> Response {
    let Some(event) = load_event(&state, &slug).await else {
        return not_found();
    };
    if form.email.trim().is_empty() {
        let notice = Notice::Failed("Email is required".to_string());
        return render_event(&state, &event, &notice, StatusCode::BAD_REQUEST).await;
    }

    let input = CreateBookingInput::for_event(&event.id, form.email);
    let (status, outcome) = book(&state, input).await;
    if outcome.success {
        render_event(&state, &event, &Notice::Booked, StatusCode::OK).await
    } else {
        let message = outcome
            .error
            .unwrap_or_else(|| "Failed to create booking".to_string());
        render_event(&state, &event, &Notice::Failed(message), status).await
    }
}

async fn load_event(state: &AppState, slug: &str) -> Option<Event> {
    let result = match build_hub(state).await {
        Ok(hub) => hub.events().get_by_slug(slug),
        Err(err) => Err(err),
    };
    match result {
        Ok(event) => event,
        Err(HubError::Event(EventError::InvalidInput { .. })) => None,
        Err(err) => {
            error!(%slug, error = %err, "failed to load event");
            None
        }
    }
}

async fn render_event(state: &AppState, event: &Event, notice: &Notice, status: StatusCode) -> Response {
    let (bookings, similar) = match build_hub(state).await {
        Ok(hub) => {
            let bookings = hub.bookings().count_for_event(&event.id).unwrap_or_else(|err| {
                warn!(event_id = %event.id, error = %err, "booking count unavailable");
                0
            });
            (bookings, hub.events().similar(&event.slug))
        }
        Err(_) => (0, Vec::new()),
    };
    let body = event_detail(event, bookings, &similar, notice);
    (status, Html(layout(&event.title, &body))).into_response()
}

fn not_found() -> Response {
    let body = r#"<section class="text-center">
<h1>Event not found</h1>
<p class="subheading">The event you are looking for does not exist or has been removed.</p>
<a id="explore-btn" href="/">Back to events</a>
</section>"#;
    (StatusCode::NOT_FOUND, Html(layout("Event not found", body))).into_response()
}

fn event_detail(event: &Event, bookings: u32, similar: &[Event], notice: &Notice) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section id="event">
<div class="header">
<h1>Event Description</h1>
<p>{description}</p>
</div>
<div class="details">
<div class="content">
<img src="{image}" alt="Event Banner" class="banner">
<section>
<h2>Overview</h2>
<p>{overview}</p>
</section>
<section>
<h2>Event Details</h2>
<p>Date: {date}</p>
<p>Time: {time}</p>
<p>Location: {venue}, {location}</p>
<p>Mode: {mode}</p>
<p>Audience: {audience}</p>
</section>
<div class="agenda">
<h2>Event Agenda</h2>
<ul>
"#,
        description = escape(&event.description),
        image = escape(&event.image),
        overview = escape(&event.overview),
        date = event.date,
        time = escape(&event.time),
        venue = escape(&event.venue),
        location = escape(&event.location),
        mode = event.mode,
        audience = escape(&event.audience),
    );
    for item in &event.agenda {
        let _ = writeln!(html, "<li>{}</li>", escape(item));
    }
    let _ = write!(
        html,
        r#"</ul>
</div>
<section>
<h2>About the Organizer</h2>
<p>{organizer}</p>
</section>
<div class="pills">
"#,
        organizer = escape(&event.organizer),
    );
    for tag in &event.tags {
        let _ = writeln!(html, r#"<div class="pill">{}</div>"#, escape(tag));
    }
    html.push_str("</div>\n</div>\n");

    html.push_str(r#"<aside class="booking"><div class="signup-card"><h2>Book Your Spot</h2>"#);
    if bookings > 0 {
        let _ = write!(
            html,
            r#"<p class="subheading">Join {bookings} people who have already booked for this event. Don't miss out on an amazing experience!</p>"#
        );
    } else {
        html.push_str(r#"<p class="subheading">Be the first to book for this event and secure your spot!</p>"#);
    }
    html.push_str(&booking_form(&event.slug, notice));
    html.push_str("</div></aside>\n</div>\n");

    if !similar.is_empty() {
        html.push_str(r#"<div class="similar"><h2>Similar Events</h2>"#);
        html.push_str(&event_cards(similar));
        html.push_str("</div>");
    }
    html.push_str("</section>");
    html
}

fn booking_form(slug: &str, notice: &Notice) -> String {
    match notice {
        Notice::Booked => {
            r#"<div id="book-event"><p class="notice ok">Thanks for Signing Up! Check your email.</p></div>"#
                .to_string()
        }
        Notice::Idle | Notice::Failed(_) => {
            let error = match notice {
                Notice::Failed(message) => {
                    format!(r#"<p class="notice error">{}</p>"#, escape(message))
                }
                _ => String::new(),
            };
            format!(
                r#"<div id="book-event"><form method="post" action="/events/{slug}/book">
<label for="email">Email Address</label>
<input type="email" name="email" id="email" placeholder="Enter your email address" required>
{error}
<button type="submit" class="button-submit">Submit</button>
</form></div>"#,
                slug = escape(slug),
            )
        }
    }
}

fn event_cards(events: &[Event]) -> String {
    let mut html = String::from(r#"<ul class="events">"#);
    for event in events {
        let _ = write!(
            html,
            r#"<li><a class="event-card" href="/events/{slug}">
<img class="poster" src="{image}" alt="{title}">
<p class="meta">{location}</p>
<p class="title">{title}</p>
<p class="meta">{date} | {time}</p>
</a></li>"#,
            slug = escape(&event.slug),
            image = escape(&event.image),
            title = escape(&event.title),
            location = escape(&event.location),
            date = event.date,
            time = escape(&event.time),
        );
    }
    html.push_str("</ul>");
    html
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/styles.css">
</head>
<body>
<header class="nav">
<a class="logo" href="/">DevEvent</a>
<ul><li><a href="/">Home</a></li><li><a href="/#events">Events</a></li><li><a href="/api/docs">API</a></li></ul>
</header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
