//! Config model validation tests for harvest-transform-config.
// crates/harvest-transform-config/tests/model_validation.rs
// =============================================================================
// Module: Config Model Validation Tests
// Description: Validate per-section bounds and strict decoding.
// Purpose: Ensure every out-of-bounds setting fails closed, naming its field.
// =============================================================================

use harvest_transform_config::ConfigError;
use harvest_transform_config::HarvestTransformConfig;
use harvest_transform_config::config_toml_example;

type TestResult = Result<(), String>;

const VALID_ROOT: &str = "[transform]\noutput_root = \"https://catalogue.example.org\"\n";

fn assert_invalid(result: Result<HarvestTransformConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

// ============================================================================
// SECTION: Transform Section
// ============================================================================

#[test]
fn empty_config_is_missing_its_output_root() -> TestResult {
    assert_invalid(
        HarvestTransformConfig::from_toml_str(""),
        "transform.output_root is required",
    )?;
    Ok(())
}

#[test]
fn output_root_must_be_an_absolute_http_url() -> TestResult {
    assert_invalid(
        HarvestTransformConfig::from_toml_str(
            "[transform]\noutput_root = \"not a url\"\n",
        ),
        "transform.output_root must be an absolute url",
    )?;
    assert_invalid(
        HarvestTransformConfig::from_toml_str(
            "[transform]\noutput_root = \"ftp://host/cat\"\n",
        ),
        "transform.output_root must use http or https",
    )?;
    Ok(())
}

#[test]
fn blank_workspace_override_is_rejected() -> TestResult {
    let text = format!("{VALID_ROOT}workspace = \"  \"\n");
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&text),
        "transform.workspace must be non-empty when set",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Runner Section
// ============================================================================

#[test]
fn worker_count_is_bounded() -> TestResult {
    for workers in [0, 65] {
        let text = format!("{VALID_ROOT}[runner]\nworkers = {workers}\n");
        assert_invalid(
            HarvestTransformConfig::from_toml_str(&text),
            "runner.workers must be between 1 and 64",
        )?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Fetch Section
// ============================================================================

#[test]
fn fetch_bounds_are_enforced() -> TestResult {
    let zero_timeout = format!("{VALID_ROOT}[fetch]\ntimeout_ms = 0\n");
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&zero_timeout),
        "fetch.timeout_ms must be between",
    )?;
    let zero_bytes = format!("{VALID_ROOT}[fetch]\nmax_asset_bytes = 0\n");
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&zero_bytes),
        "fetch.max_asset_bytes must be between",
    )?;
    let blank_agent = format!("{VALID_ROOT}[fetch]\nuser_agent = \" \"\n");
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&blank_agent),
        "fetch.user_agent must be non-empty",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Strict Decoding
// ============================================================================

#[test]
fn unknown_fields_fail_to_decode() -> TestResult {
    let top_level = format!("surprise = true\n{VALID_ROOT}");
    if HarvestTransformConfig::from_toml_str(&top_level).is_ok() {
        return Err("unknown top-level field should be rejected".to_string());
    }
    let nested = format!("{VALID_ROOT}[fetch]\nfollow_redirects = true\n");
    if HarvestTransformConfig::from_toml_str(&nested).is_ok() {
        return Err("unknown fetch field should be rejected".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Render Entries
// ============================================================================

#[test]
fn render_entries_require_a_collection_and_a_profile_table() -> TestResult {
    let blank_collection = format!(
        "{VALID_ROOT}[[render]]\ncollection = \" \"\n[render.profile]\nkey = 1\n"
    );
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&blank_collection),
        "render.collection must be non-empty",
    )?;
    let scalar_profile =
        format!("{VALID_ROOT}[[render]]\ncollection = \"s2\"\nprofile = 7\n");
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&scalar_profile),
        "render.profile for s2 must be a table",
    )?;
    Ok(())
}

#[test]
fn duplicate_render_collections_are_rejected() -> TestResult {
    let text = format!(
        "{VALID_ROOT}\
         [[render]]\ncollection = \"s2\"\n[render.profile]\na = 1\n\
         [[render]]\ncollection = \"s2\"\n[render.profile]\nb = 2\n"
    );
    assert_invalid(
        HarvestTransformConfig::from_toml_str(&text),
        "duplicate render entry for collection s2",
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Template
// ============================================================================

#[test]
fn shipped_template_parses_and_validates() -> TestResult {
    let config = HarvestTransformConfig::from_toml_str(&config_toml_example())
        .map_err(|err| err.to_string())?;
    if config.render.len() != 1 || config.render[0].collection != "sentinel-2-l2a" {
        return Err("template should carry one render entry".to_string());
    }
    if !config.render[0].profile["overview"].is_object() {
        return Err("template render profile should be a table".to_string());
    }
    Ok(())
}
