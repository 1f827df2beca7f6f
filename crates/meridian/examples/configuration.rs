//! Navigator configuration and customization
//!
//! This example demonstrates how to customize navigation behavior using
//! preset and hand-built configurations for various use cases.

use std::time::Duration;

use meridian::{NavigatorConfig, NavigatorConfigBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    preset_configs();
    custom_configs();
    endpoint_overrides();
    Ok(())
}

fn preset_configs() {
    println!("Preset configurations:");

    // Defaults: balanced for interactive search-as-you-type
    let default_config = NavigatorConfig::default();
    describe("Default", &default_config);

    // Fast - fewer requests, fewer results, no cinematic close-ups
    let fast_config = NavigatorConfigBuilder::fast().build();
    describe("Fast", &fast_config);

    // Comprehensive - snappier debounce, full visual detail
    let comprehensive_config = NavigatorConfigBuilder::comprehensive().build();
    describe("Comprehensive", &comprehensive_config);
}

fn custom_configs() {
    println!("\nCustom configurations:");

    // Autocomplete backend - tight shortlist, long cache
    let autocomplete = NavigatorConfigBuilder::new()
        .debounce(Duration::from_millis(180))
        .suggest_limit(5)
        .shortlist_cap(3)
        .cache_ttl(Duration::from_secs(1800))
        .build();
    describe("Autocomplete", &autocomplete);

    // Kiosk display - localized, no 3D work at all
    let kiosk = NavigatorConfigBuilder::new()
        .language("ja")
        .closeups(false)
        .highlight(false)
        .lookup_page_size(10)
        .build();
    describe("Kiosk", &kiosk);

    // Out-of-range values are clamped rather than rejected.
    let clamped = NavigatorConfigBuilder::new()
        .suggest_limit(50)
        .shortlist_cap(0)
        .build();
    println!(
        "  Clamped:       suggest_limit {} (asked for 50), shortlist_cap {} (asked for 0)",
        clamped.suggest_limit, clamped.shortlist_cap
    );
}

fn endpoint_overrides() {
    println!("\nEndpoint overrides (self-hosted or proxied deployments):");

    let config = NavigatorConfigBuilder::new()
        .access_token("pk.example")
        .request_timeout(Duration::from_secs(4))
        .endpoints()
        .geocode("https://geo.internal.example.com/v6")
        .lookup("https://records.internal.example.com")
        .done()
        .build();

    println!("  geocode base:  {}", config.provider.geocode_base);
    println!("  lookup base:   {}", config.provider.lookup_base);
    println!("  timeout:       {:?}", config.provider.request_timeout);
}

fn describe(name: &str, config: &NavigatorConfig) {
    println!(
        "  {:<14} debounce {:>3}ms, {} suggestions, closeups {}, highlight {}",
        format!("{name}:"),
        config.debounce.as_millis(),
        config.suggest_limit,
        config.closeups,
        config.highlight
    );
}
