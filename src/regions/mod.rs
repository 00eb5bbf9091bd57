//! Regional service-area registry
//!
//! The region-targeted fetch variant works against a health-insurance portal
//! that personalizes its services listing per regional association. This
//! module holds the region table (code, name, sample postal code, city) and
//! the heuristics matching a region to URL path segments.
//!
//! Path matching is an explicit ordered list of pure resolution attempts
//! with a first-match-wins contract: exact name, derived slug, region code.

/// One regional association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Short region code (e.g. `BAY`)
    pub code: &'static str,

    /// Human-readable region name
    pub name: &'static str,

    /// A sample postal code inside the region
    pub postal_code: &'static str,

    /// City the sample postal code belongs to
    pub city: &'static str,
}

/// All known regions
pub const REGIONS: &[Region] = &[
    Region { code: "BAY", name: "Bayern", postal_code: "80331", city: "München" },
    Region { code: "BW", name: "Baden-Württemberg", postal_code: "70173", city: "Stuttgart" },
    Region { code: "NO", name: "Nordost", postal_code: "10115", city: "Berlin" },
    Region { code: "NW", name: "Nordwest", postal_code: "44135", city: "Dortmund" },
    Region { code: "HE", name: "Hessen", postal_code: "60311", city: "Frankfurt" },
    Region { code: "RH", name: "Rheinland-Hamburg", postal_code: "50667", city: "Köln" },
    Region { code: "RP", name: "Rheinland-Pfalz-Saarland", postal_code: "55116", city: "Mainz" },
    Region { code: "SA", name: "Sachsen-Anhalt", postal_code: "39104", city: "Magdeburg" },
    Region { code: "NI", name: "Niedersachsen", postal_code: "30159", city: "Hannover" },
    Region { code: "PL", name: "PLUS", postal_code: "01067", city: "Dresden" },
    Region { code: "BR", name: "Bremen-Bremerhaven", postal_code: "28195", city: "Bremen" },
];

/// Postal-code ranges per region, checked in order (first match wins)
///
/// Simplified mapping based on leading digits; ranges may overlap, in which
/// case the earlier entry takes the code.
const POSTAL_RANGES: &[(&str, &[(u32, u32)])] = &[
    ("BAY", &[(80000, 96999)]),
    ("BW", &[(68000, 79999)]),
    ("NO", &[(10000, 19999)]),
    ("NW", &[(20000, 29999), (40000, 49999)]),
    ("HE", &[(60000, 65999)]),
    ("RH", &[(50000, 59999)]),
    ("RP", &[(55000, 57999), (66000, 67999)]),
    ("SA", &[(38000, 39999)]),
    ("NI", &[(30000, 37999)]),
    ("PL", &[(1000, 9999), (98000, 99999)]),
    ("BR", &[(28000, 28999)]),
];

/// Looks a region up by its code, case-insensitively
pub fn by_code(code: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.code.eq_ignore_ascii_case(code))
}

/// Looks a region up by its full name, case-insensitively
pub fn by_name(name: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

/// Maps a postal code to a region via the range table
pub fn by_postal_code(postal_code: &str) -> Option<&'static Region> {
    let number: u32 = postal_code.trim().parse().ok()?;

    for (code, ranges) in POSTAL_RANGES {
        if ranges.iter().any(|(lo, hi)| number >= *lo && number <= *hi) {
            return by_code(code);
        }
    }

    None
}

/// Derives the URL slug of a region name
///
/// Lowercases, transliterates German umlauts, and collapses every
/// non-alphanumeric run into a single hyphen.
pub fn derived_slug(region: &Region) -> String {
    let mut slug = String::with_capacity(region.name.len());

    for c in region.name.to_lowercase().chars() {
        match c {
            'ä' => slug.push_str("ae"),
            'ö' => slug.push_str("oe"),
            'ü' => slug.push_str("ue"),
            'ß' => slug.push_str("ss"),
            c if c.is_ascii_alphanumeric() => slug.push(c),
            _ => {
                if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
        }
    }

    slug.trim_matches('-').to_string()
}

/// Checks whether a URL path belongs to the given region
///
/// Runs the ordered resolution attempts against every path segment:
///
/// 1. exact lowercase name match
/// 2. derived-slug match
/// 3. region-code match
pub fn path_matches(region: &Region, path: &str) -> bool {
    path.split('/').filter(|s| !s.is_empty()).any(|segment| {
        matches_exact_name(region, segment)
            || matches_derived_slug(region, segment)
            || matches_code(region, segment)
    })
}

/// Checks whether a URL path matches any region other than the given one
///
/// Used to drop links that a broad slug heuristic would otherwise claim for
/// the wrong region.
pub fn path_matches_other(region: &Region, path: &str) -> bool {
    REGIONS
        .iter()
        .filter(|other| other.code != region.code)
        .any(|other| path_matches(other, path))
}

/// Attempt 1: the segment equals the lowercased region name
fn matches_exact_name(region: &Region, segment: &str) -> bool {
    segment.eq_ignore_ascii_case(region.name)
}

/// Attempt 2: the segment equals the derived slug
fn matches_derived_slug(region: &Region, segment: &str) -> bool {
    segment.to_lowercase() == derived_slug(region)
}

/// Attempt 3: the segment equals the region code
fn matches_code(region: &Region, segment: &str) -> bool {
    segment.eq_ignore_ascii_case(region.code)
}

/// Formats the region table for CLI display
pub fn overview() -> String {
    let mut out = String::new();
    out.push_str("Code | Name                      | PLZ   | Stadt\n");
    out.push_str("-----|---------------------------|-------|-----------\n");

    for region in REGIONS {
        out.push_str(&format!(
            "{:<4} | {:<25} | {:<5} | {}\n",
            region.code, region.name, region.postal_code, region.city
        ));
    }

    out.push_str(&format!("\n{} Regionen\n", REGIONS.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_code_case_insensitive() {
        assert_eq!(by_code("bay").unwrap().name, "Bayern");
        assert_eq!(by_code("BAY").unwrap().name, "Bayern");
    }

    #[test]
    fn test_unknown_code() {
        assert!(by_code("XYZ").is_none());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("bayern").unwrap().code, "BAY");
        assert_eq!(by_name("Rheinland-Hamburg").unwrap().code, "RH");
    }

    #[test]
    fn test_postal_code_lookup() {
        assert_eq!(by_postal_code("80331").unwrap().code, "BAY");
        assert_eq!(by_postal_code("10115").unwrap().code, "NO");
        assert_eq!(by_postal_code("70173").unwrap().code, "BW");
    }

    #[test]
    fn test_postal_code_first_match_wins() {
        // 55116 sits in both the RH (50000-59999) and RP (55000-57999)
        // ranges; the earlier entry claims it
        assert_eq!(by_postal_code("55116").unwrap().code, "RH");
    }

    #[test]
    fn test_postal_code_invalid() {
        assert!(by_postal_code("not-a-plz").is_none());
        assert!(by_postal_code("99999999").is_none());
    }

    #[test]
    fn test_derived_slug_transliterates() {
        let bw = by_code("BW").unwrap();
        assert_eq!(derived_slug(bw), "baden-wuerttemberg");
    }

    #[test]
    fn test_derived_slug_simple() {
        let bay = by_code("BAY").unwrap();
        assert_eq!(derived_slug(bay), "bayern");
    }

    #[test]
    fn test_path_matches_slug_segment() {
        let bay = by_code("BAY").unwrap();
        assert!(path_matches(bay, "/pk/bayern/leistungen/zahnvorsorge/"));
        assert!(!path_matches(bay, "/pk/leistungen/zahnvorsorge/"));
    }

    #[test]
    fn test_path_matches_umlaut_slug() {
        let bw = by_code("BW").unwrap();
        assert!(path_matches(bw, "/pk/baden-wuerttemberg/leistungen/"));
    }

    #[test]
    fn test_path_matches_requires_whole_segment() {
        let bay = by_code("BAY").unwrap();
        assert!(!path_matches(bay, "/pk/bayernwerk/"));
    }

    #[test]
    fn test_path_matches_other() {
        let bay = by_code("BAY").unwrap();
        assert!(path_matches_other(bay, "/pk/hessen/leistungen/"));
        assert!(!path_matches_other(bay, "/pk/bayern/leistungen/"));
    }

    #[test]
    fn test_overview_lists_all_regions() {
        let table = overview();
        for region in REGIONS {
            assert!(table.contains(region.code));
        }
    }
}
