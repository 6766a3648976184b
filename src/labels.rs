/// Human-readable labels for the fixed demographic enumerations. Unknown
/// codes pass through verbatim so new buckets still render.
pub fn age_label(code: &str) -> &str {
    match code {
        "under18" => "Under 18",
        "18-24" => "18-24",
        "25-34" => "25-34",
        "35-44" => "35-44",
        "45-54" => "45-54",
        "55+" => "55 and over",
        other => other,
    }
}

pub fn occupation_label(code: &str) -> &str {
    match code {
        "student" => "Student",
        "employee" => "Employee",
        "business" => "Business owner",
        "freelance" => "Freelancer",
        "unemployed" => "Unemployed",
        "retired" => "Retired",
        "other" => "Other",
        unknown => unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_labels() {
        assert_eq!(age_label("under18"), "Under 18");
        assert_eq!(age_label("55+"), "55 and over");
        assert_eq!(occupation_label("student"), "Student");
        assert_eq!(occupation_label("retired"), "Retired");
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(age_label("65-74"), "65-74");
        assert_eq!(occupation_label("astronaut"), "astronaut");
    }
}
