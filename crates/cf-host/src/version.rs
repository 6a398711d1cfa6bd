//! CLI version reporting and minimum-version negotiation.

use cf_plugin::VersionType;
use thiserror::Error;

/// Version reported by development builds.
pub const BUILT_FROM_SOURCE: &str = "0.0.0-unknown-version";

/// Version of the running CLI, stamped at build time through
/// `CF_BUILD_VERSION`.
pub const CLI_VERSION: &str = match option_env!("CF_BUILD_VERSION") {
    Some(version) => version,
    None => BUILT_FROM_SOURCE,
};

/// A version string that is not `MAJOR.MINOR.PATCH`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{version}': expected MAJOR.MINOR.PATCH")]
pub struct VersionError {
    version: String,
}

/// Parses `MAJOR.MINOR.PATCH`, ignoring pre-release and build suffixes.
///
/// # Errors
///
/// Returns [`VersionError`] when any component is missing or not numeric.
pub fn parse_version(text: &str) -> Result<VersionType, VersionError> {
    let invalid = || VersionError {
        version: text.to_owned(),
    };
    let core = text
        .trim()
        .trim_start_matches('v')
        .split(['+', '-'])
        .next()
        .unwrap_or_default();
    let mut parts = core.split('.').map(str::parse::<u32>);
    let mut next = || parts.next().and_then(Result::ok).ok_or_else(invalid);
    let version = VersionType::new(next()?, next()?, next()?);
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(version)
}

/// Returns `true` when `actual` satisfies `required`. Development builds
/// satisfy every requirement.
///
/// # Errors
///
/// Returns [`VersionError`] when either version cannot be parsed.
pub fn satisfies(actual: &str, required: &str) -> Result<bool, VersionError> {
    if actual == BUILT_FROM_SOURCE {
        return Ok(true);
    }
    Ok(parse_version(actual)? >= parse_version(required)?)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("6.53.0", VersionType::new(6, 53, 0))]
    #[case::build_metadata("7.2.0+be4a5ce2b.2020-12-10", VersionType::new(7, 2, 0))]
    #[case::pre_release("8.0.0-beta.1", VersionType::new(8, 0, 0))]
    #[case::prefixed("v1.2.3", VersionType::new(1, 2, 3))]
    fn parses_versions(#[case] text: &str, #[case] expected: VersionType) {
        assert_eq!(parse_version(text).expect("parse"), expected);
    }

    #[rstest]
    #[case::too_short("1.2")]
    #[case::too_long("1.2.3.4")]
    #[case::not_numeric("one.two.three")]
    #[case::empty("")]
    fn rejects_malformed_versions(#[case] text: &str) {
        assert!(parse_version(text).is_err());
    }

    #[rstest]
    #[case::sentinel(BUILT_FROM_SOURCE, "99.0.0", true)]
    #[case::older("6.10.0", "6.11.0", false)]
    #[case::equal("6.11.0", "6.11.0", true)]
    #[case::newer_minor("6.12.0", "6.11.9", true)]
    fn compares_against_requirement(
        #[case] actual: &str,
        #[case] required: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(satisfies(actual, required).expect("compare"), expected);
    }

    #[test]
    fn sentinel_ignores_unparseable_requirements() {
        assert!(satisfies(BUILT_FROM_SOURCE, "garbage").expect("compare"));
    }
}
