//! Reply injection — simulated user interaction with the page's own
//! composition controls.

use std::time::Duration;

use tracing::{debug, warn};

use crate::driver::{PageDriver, PageEvent};

/// Fixed best-effort locators for the message-entry control.
const INPUT_LOCATORS: &[&str] = &["textarea.message-input", "textarea", "input[type='text']"];

/// Fixed best-effort locators for the submit control.
const SUBMIT_LOCATORS: &[&str] = &[
    r#"button[aria-label="Send message"]"#,
    "button.send",
    "button[type='submit']",
];

/// Inject `reply_text` into the page's entry control and submit it.
///
/// Returns `true` only if the click was issued without a driver fault; the
/// host page actually delivering the message is not confirmed. The settle
/// delay between the enabling attempts and the final click is a heuristic
/// to let the page's own event handling run, not a guarantee.
pub async fn inject(driver: &dyn PageDriver, reply_text: &str, settle_delay: Duration) -> bool {
    let Some(input) = locate(driver, INPUT_LOCATORS).await else {
        warn!("Could not find message input control");
        return false;
    };
    let Some(submit) = locate(driver, SUBMIT_LOCATORS).await else {
        warn!("Could not find submit control");
        return false;
    };

    if let Err(e) = driver.set_value(input, reply_text).await {
        warn!("Failed to set reply text: {}", e);
        return false;
    }
    for event in [PageEvent::Input, PageEvent::Change] {
        if let Err(e) = driver.dispatch(input, event).await {
            warn!("Failed to dispatch {} event: {}", event.name(), e);
            return false;
        }
    }

    // The submit control may start disabled under the page's own
    // validation. Attempt each enabling strategy independently; any one
    // of them may be the one that works.
    if let Err(e) = driver.clear_disabled(submit).await {
        debug!("clear_disabled failed: {}", e);
    }
    for event in [PageEvent::MouseOver, PageEvent::MouseDown, PageEvent::MouseUp] {
        if let Err(e) = driver.dispatch(submit, event).await {
            debug!("Pointer event {} failed: {}", event.name(), e);
        }
    }

    tokio::time::sleep(settle_delay).await;

    match driver.click(submit).await {
        Ok(()) => {
            debug!("Reply submitted via {}", submit);
            true
        }
        Err(e) => {
            warn!("Failed to click submit control: {}", e);
            false
        }
    }
}

/// First locator that matches an element on the page, if any.
async fn locate<'a>(driver: &dyn PageDriver, locators: &[&'a str]) -> Option<&'a str> {
    for locator in locators {
        match driver.exists(locator).await {
            Ok(true) => return Some(locator),
            Ok(false) => {}
            Err(e) => debug!("Locator probe '{}' failed: {}", locator, e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPage;

    const COMPOSER: &str = r#"
        <html><body>
            <textarea class="message-input"></textarea>
            <button aria-label="Send message" disabled>Send</button>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_inject_happy_path() {
        let page = SimPage::new("https://voice.example/messages", COMPOSER);
        let ok = inject(&page, "ok thanks", Duration::ZERO).await;
        assert!(ok);

        assert_eq!(
            page.value_of("textarea.message-input").as_deref(),
            Some("ok thanks")
        );
        // Value write must be followed by the notification events.
        let events = page.events_for("textarea.message-input");
        assert_eq!(events, vec!["input", "change"]);
        // All enabling strategies ran before the click.
        assert!(!page.disabled_cleared().is_empty());
        let pointer = page.events_for(r#"button[aria-label="Send message"]"#);
        assert_eq!(pointer, vec!["mouseover", "mousedown", "mouseup"]);
        assert_eq!(page.clicks().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_is_soft_failure() {
        let page = SimPage::new(
            "https://x/y",
            r#"<html><body><button type="submit">Send</button></body></html>"#,
        );
        assert!(!inject(&page, "hi", Duration::ZERO).await);
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_missing_submit_is_soft_failure() {
        let page = SimPage::new(
            "https://x/y",
            "<html><body><textarea></textarea></body></html>",
        );
        assert!(!inject(&page, "hi", Duration::ZERO).await);
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_click_fault_returns_false() {
        let page = SimPage::new("https://x/y", COMPOSER);
        page.fail_next_click();
        assert!(!inject(&page, "hi", Duration::ZERO).await);
    }

    #[tokio::test]
    async fn test_fallback_locators() {
        let page = SimPage::new(
            "https://x/y",
            r#"<html><body>
                <textarea></textarea>
                <button class="send">Go</button>
            </body></html>"#,
        );
        assert!(inject(&page, "hi", Duration::ZERO).await);
        assert_eq!(page.value_of("textarea").as_deref(), Some("hi"));
        assert_eq!(page.clicks(), vec!["button.send"]);
    }
}
