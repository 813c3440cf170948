use crate::error::EventError;
use crate::events::EventRepository;
use crate::types::EventId;

/// Lowercases and trims `title`, strips everything outside `[a-z0-9_\s-]`,
/// then turns whitespace runs into one hyphen and collapses repeated hyphens.
///
/// Trimming happens before stripping, so a title such as `"! Launch"` keeps
/// the leading hyphen produced by the inner space.
pub fn base_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for ch in lowered
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-' || ch.is_whitespace())
    {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            push_hyphen(&mut slug);
            in_whitespace = false;
        }
        if ch == '-' {
            push_hyphen(&mut slug);
        } else {
            slug.push(ch);
        }
    }
    if in_whitespace {
        push_hyphen(&mut slug);
    }
    slug
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

/// Picks the slug for event `id` titled `title`: the base slug when no other
/// event owns it, otherwise the base slug suffixed with the event's own id.
pub fn unique_slug<R: EventRepository>(
    repo: &R,
    title: &str,
    id: &EventId,
) -> Result<String, EventError> {
    let base = base_slug(title);
    if base.is_empty() {
        return Err(EventError::invalid(
            "title",
            "title must contain at least one letter or digit",
        ));
    }
    if repo.slug_taken(&base, id)? {
        return Ok(format!("{base}-{}", id.as_str().to_lowercase()));
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_slug_basic() {
        assert_eq!(base_slug("React Summit 2024"), "react-summit-2024");
        assert_eq!(base_slug("  Next.js   Conf  "), "nextjs-conf");
        assert_eq!(base_slug("AI & Tech Conference"), "ai-tech-conference");
    }

    #[test]
    fn test_base_slug_collapses_hyphens() {
        assert_eq!(base_slug("Rust -- Meetup"), "rust-meetup");
        assert_eq!(base_slug("a---b"), "a-b");
        assert_eq!(base_slug("snake_case_fest"), "snake_case_fest");
    }

    #[test]
    fn test_base_slug_strips_after_trim() {
        assert_eq!(base_slug("! Launch"), "-launch");
        assert_eq!(base_slug("Café Night"), "caf-night");
    }

    #[test]
    fn test_base_slug_can_be_empty() {
        assert_eq!(base_slug("!!!"), "");
        assert_eq!(base_slug("   "), "");
    }
}
