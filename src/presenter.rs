// Rate menu, selection and availability listing

use std::io::Write;

use tracing::{debug, info, warn};

use crate::client::AvailabilityApi;
use crate::dates::format_display;
use crate::error::{AvailabilityError, Result};
use crate::models::{Availability, AvailabilityResponse, Rate};
use crate::prompt::Prompt;

pub const SELECTION_PROMPT: &str =
    "\nPlease input number for which event you'd like availability for:\n> ";

const MISSING: &str = "N/A";

/// Supplier/product pair the lookup runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub supplier_id: String,
    pub product_id: String,
}

/// One numbered line of the rate menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub index: usize,
    pub rate_key: String,
    pub display_name: String,
    pub adult_price: String,
    pub child_price: String,
    pub result_count: usize,
}

impl MenuEntry {
    fn new(index: usize, rate_key: &str, rate: &Rate, supplier_name: &str, result_count: usize) -> Self {
        let price = |tier: &str| {
            rate.price(tier)
                .map(|amount| amount.to_string())
                .unwrap_or_else(|| MISSING.to_string())
        };

        Self {
            index,
            rate_key: rate_key.to_string(),
            display_name: format!("{} ({})", rate.name, supplier_name),
            adult_price: price("Adult"),
            child_price: price("Child"),
            result_count,
        }
    }
}

/// Fetches every rate listed in the response and numbers them from 1, in
/// response order. Fails with `EmptyResults` before any call when no rate
/// has availability.
pub async fn build_menu(
    api: &dyn AvailabilityApi,
    query: &AvailabilityQuery,
    data: &AvailabilityResponse,
) -> Result<Vec<MenuEntry>> {
    let by_rate = &data.availabilities.by_rate;
    if by_rate.is_empty() {
        return Err(AvailabilityError::EmptyResults);
    }

    // Same supplier for every rate, one lookup is enough
    let supplier_name = api.get_supplier_name(&query.supplier_id).await?;

    let mut entries = Vec::new();
    for (position, (rate_key, rate_availability)) in by_rate.iter().enumerate() {
        let rate = api
            .get_rate(&query.supplier_id, &query.product_id, rate_key)
            .await?;
        entries.push(MenuEntry::new(
            position + 1,
            rate_key,
            &rate,
            &supplier_name,
            rate_availability.availability.len(),
        ));
    }

    info!(rates = entries.len(), "rate menu built");
    Ok(entries)
}

pub fn write_menu(out: &mut dyn Write, entries: &[MenuEntry]) -> Result<()> {
    for entry in entries {
        writeln!(
            out,
            "\n{}. {}\n   Pricing:\n      Adult: {}\n      Child: {}",
            entry.index, entry.display_name, entry.adult_price, entry.child_price
        )?;
        writeln!(out, "   Results: {}", entry.result_count)?;
    }
    Ok(())
}

/// Turns a typed answer into a menu position, 1-based.
pub fn parse_selection(input: &str, entry_count: usize) -> Result<usize> {
    let choice: i64 = input
        .trim()
        .parse()
        .map_err(|_| AvailabilityError::InvalidSelection(format!("'{}' is not a number", input)))?;

    if choice < 1 || choice as usize > entry_count {
        return Err(AvailabilityError::InvalidSelection(format!(
            "{} is not between 1 and {}",
            choice, entry_count
        )));
    }
    Ok(choice as usize)
}

/// Asks until the answer names a menu entry. There is no retry limit; the
/// loop only ends early when input runs out.
pub fn select_entry<'a>(
    entries: &'a [MenuEntry],
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<&'a MenuEntry> {
    loop {
        let answer = prompt
            .ask(SELECTION_PROMPT)?
            .ok_or(AvailabilityError::InputClosed)?;

        match parse_selection(&answer, entries.len()) {
            Ok(index) => return Ok(&entries[index - 1]),
            Err(err @ AvailabilityError::InvalidSelection(_)) => {
                debug!(error = ?err, "rejected selection");
                writeln!(out, "{}", err)?;
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn write_availability(out: &mut dyn Write, windows: &[Availability]) -> Result<()> {
    for window in windows {
        let capacity = window
            .capacity
            .map(|c| c.to_string())
            .unwrap_or_else(|| MISSING.to_string());
        writeln!(
            out,
            "Start: {}\nEnd: {}\nCapacity: {}\n",
            format_display(&window.start)?,
            format_display(&window.end)?,
            capacity
        )?;
    }
    Ok(())
}

/// Runs the interactive part of a lookup: menu, selection, then every
/// availability window of the chosen rate.
pub async fn present(
    api: &dyn AvailabilityApi,
    query: &AvailabilityQuery,
    data: &AvailabilityResponse,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<()> {
    let entries = build_menu(api, query, data).await?;

    // The heading is optional; a failed product lookup never blocks the listing
    match api
        .get_product_name(&query.supplier_id, &query.product_id)
        .await
    {
        Ok(product_name) => writeln!(out, "\nAvailability for {}", product_name)?,
        Err(err) => warn!(error = %err, "product lookup failed, skipping heading"),
    }
    write_menu(out, &entries)?;

    let selected = select_entry(&entries, prompt, out)?;
    info!(rate = %selected.rate_key, "rate selected");

    let windows = data
        .availabilities
        .by_rate
        .get(&selected.rate_key)
        .map(|rate| rate.availability.as_slice())
        .unwrap_or_default();
    write_availability(out, windows)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_api::MockApi;
    use crate::client::{parse_availabilities, RawResponse};
    use crate::prompt::ScriptedPrompt;
    use test_case::test_case;

    const TWO_RATES: &str = r#"{
        "availabilities": {
            "byRate": {
                "rate-a": {"availability": [
                    {"start": "2019-10-28T09:00:00+00:00", "end": "2019-10-28T11:00:00+00:00", "capacity": 20}
                ]},
                "rate-b": {"availability": [
                    {"start": "2019-10-29T14:00:00+00:00", "end": "2019-10-29T15:30:00+00:00", "capacity": 4},
                    {"start": "2019-10-30T14:00:00+00:00", "end": "2019-10-30T15:30:00+00:00"}
                ]}
            }
        }
    }"#;

    fn query() -> AvailabilityQuery {
        AvailabilityQuery {
            supplier_id: "sup".to_string(),
            product_id: "prod".to_string(),
        }
    }

    fn two_rate_api() -> MockApi {
        MockApi::new(RawResponse::new(200, TWO_RATES))
            .with_rate("rate-a", "Morning Tour", &[("Adult", 30.0), ("Child", 15.0)])
            .with_rate("rate-b", "Sunset Tour", &[("Adult", 45.5)])
    }

    fn data(body: &str) -> AvailabilityResponse {
        parse_availabilities(&RawResponse::new(200, body)).unwrap()
    }

    #[tokio::test]
    async fn test_empty_results_make_no_calls() {
        let api = MockApi::new(RawResponse::new(200, "{}"));
        let data = data(r#"{"availabilities":{"byRate":{"rate-a":{"availability":[]},"rate-b":{"availability":[]}}}}"#);
        let mut prompt = ScriptedPrompt::new(["1"]);
        let mut out = Vec::new();

        let result = present(&api, &query(), &data, &mut prompt, &mut out).await;

        assert!(matches!(result, Err(AvailabilityError::EmptyResults)));
        assert!(api.calls().is_empty());
        assert!(prompt.asked().is_empty());
        assert_eq!(
            result.unwrap_err().to_string(),
            "\nNo results. Please alter date parameters and try again."
        );
    }

    #[tokio::test]
    async fn test_build_menu_fetches_supplier_once() {
        let api = two_rate_api();
        let entries = build_menu(&api, &query(), &data(TWO_RATES)).await.unwrap();

        assert_eq!(api.count("supplier:"), 1);
        assert_eq!(api.count("rate:"), 2);
        assert_eq!(
            entries,
            vec![
                MenuEntry {
                    index: 1,
                    rate_key: "rate-a".to_string(),
                    display_name: "Morning Tour (Harbor Tours)".to_string(),
                    adult_price: "30".to_string(),
                    child_price: "15".to_string(),
                    result_count: 1,
                },
                MenuEntry {
                    index: 2,
                    rate_key: "rate-b".to_string(),
                    display_name: "Sunset Tour (Harbor Tours)".to_string(),
                    adult_price: "45.5".to_string(),
                    child_price: "N/A".to_string(),
                    result_count: 2,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_build_menu_propagates_rate_errors() {
        let api = MockApi::new(RawResponse::new(200, TWO_RATES))
            .with_rate("rate-a", "Morning Tour", &[("Adult", 30.0), ("Child", 15.0)]);

        let result = build_menu(&api, &query(), &data(TWO_RATES)).await;
        assert!(matches!(
            result,
            Err(AvailabilityError::ApiError { status: 404, .. })
        ));
    }

    #[test]
    fn test_write_menu_layout() {
        let entries = vec![MenuEntry {
            index: 1,
            rate_key: "rate-a".to_string(),
            display_name: "Morning Tour (Harbor Tours)".to_string(),
            adult_price: "30".to_string(),
            child_price: "15".to_string(),
            result_count: 1,
        }];
        let mut out = Vec::new();
        write_menu(&mut out, &entries).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n1. Morning Tour (Harbor Tours)\n   Pricing:\n      Adult: 30\n      Child: 15\n   Results: 1\n"
        );
    }

    #[test_case("1", 3, Some(1); "#1 first")]
    #[test_case(" 3 ", 3, Some(3); "#2 padded last")]
    #[test_case("+2", 3, Some(2); "#3 explicit sign")]
    #[test_case("0", 3, None; "#4 zero")]
    #[test_case("-1", 3, None; "#5 negative")]
    #[test_case("4", 3, None; "#6 past the end")]
    #[test_case("abc", 3, None; "#7 not a number")]
    #[test_case("", 3, None; "#8 empty")]
    #[test_case("1.5", 3, None; "#9 fraction")]
    fn test_parse_selection(input: &str, count: usize, expected: Option<usize>) {
        let result = parse_selection(input, count);
        match expected {
            Some(index) => assert_eq!(result.unwrap(), index),
            None => assert!(matches!(result, Err(AvailabilityError::InvalidSelection(_)))),
        }
    }

    #[tokio::test]
    async fn test_selection_reprompts_until_valid() {
        let api = MockApi::new(RawResponse::new(200, "{}"))
            .with_rate("rate-a", "Morning Tour", &[("Adult", 30.0), ("Child", 15.0)]);
        let data = data(
            r#"{"availabilities":{"byRate":{"rate-a":{"availability":[
                {"start":"2019-10-28T09:00:00+00:00","end":"2019-10-28T11:00:00+00:00","capacity":20}]}}}}"#,
        );
        let mut prompt = ScriptedPrompt::new(["abc", "99", "1"]);
        let mut out = Vec::new();

        present(&api, &query(), &data, &mut prompt, &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert_eq!(prompt.asked().len(), 3);
        assert!(prompt.asked().iter().all(|q| q == SELECTION_PROMPT));
        assert_eq!(output.matches("Please make a valid selection.").count(), 2);
        assert!(output.contains("Start: Monday, 10/28/19 @ 9:00AM UTC"));
    }

    #[tokio::test]
    async fn test_listing_uses_selected_rate() {
        let api = two_rate_api();
        let mut prompt = ScriptedPrompt::new(["1"]);
        let mut out = Vec::new();

        present(&api, &query(), &data(TWO_RATES), &mut prompt, &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        let listing = output.split("Results: 2\n").nth(1).unwrap();
        assert_eq!(
            listing,
            "Start: Monday, 10/28/19 @ 9:00AM UTC\nEnd: Monday, 10/28/19 @ 11:00AM UTC\nCapacity: 20\n\n"
        );
    }

    #[tokio::test]
    async fn test_full_output_for_second_rate() {
        let api = two_rate_api();
        let mut prompt = ScriptedPrompt::new(["2"]);
        let mut out = Vec::new();

        present(&api, &query(), &data(TWO_RATES), &mut prompt, &mut out)
            .await
            .unwrap();

        let expected = "\nAvailability for Bay Cruise\n\
            \n1. Morning Tour (Harbor Tours)\n   Pricing:\n      Adult: 30\n      Child: 15\n   Results: 1\n\
            \n2. Sunset Tour (Harbor Tours)\n   Pricing:\n      Adult: 45.5\n      Child: N/A\n   Results: 2\n\
            Start: Tuesday, 10/29/19 @ 2:00PM UTC\nEnd: Tuesday, 10/29/19 @ 3:30PM UTC\nCapacity: 4\n\n\
            Start: Wednesday, 10/30/19 @ 2:00PM UTC\nEnd: Wednesday, 10/30/19 @ 3:30PM UTC\nCapacity: N/A\n\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(api.count("product:"), 1);
    }

    #[tokio::test]
    async fn test_failed_product_lookup_skips_heading() {
        let api = two_rate_api().without_product();
        let mut prompt = ScriptedPrompt::new(["1"]);
        let mut out = Vec::new();

        present(&api, &query(), &data(TWO_RATES), &mut prompt, &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert_eq!(api.count("product:"), 1);
        assert!(!output.contains("Availability for"));
        assert!(output.starts_with("\n1. Morning Tour (Harbor Tours)"));
        assert!(output.ends_with("Capacity: 20\n\n"));
    }

    #[tokio::test]
    async fn test_input_closed_during_selection() {
        let api = two_rate_api();
        let mut prompt = ScriptedPrompt::new(["nope"]);
        let mut out = Vec::new();

        let result = present(&api, &query(), &data(TWO_RATES), &mut prompt, &mut out).await;

        assert!(matches!(result, Err(AvailabilityError::InputClosed)));
        assert_eq!(prompt.asked().len(), 2);
    }
}
