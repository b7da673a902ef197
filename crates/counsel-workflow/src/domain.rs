use counsel_types::Domain;

/// Static configuration for one restricted domain. The table below is the
/// single source of truth for prompts and validation; adding a domain means
/// adding a row, not a branch.
pub struct DomainConfig {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub description: &'static str,
    pub restrictive: bool,
    /// Instruction block appended to the system prompt when this domain is
    /// active.
    pub instructions: &'static str,
    /// Default custom instructions offered to the client store.
    pub default_custom_instructions: &'static str,
}

static LEGAL: DomainConfig = DomainConfig {
    name: "Legal",
    keywords: &[
        "law", "legal", "court", "attorney", "lawyer", "contract", "lawsuit", "regulation",
        "statute", "litigation", "compliance", "constitutional", "criminal", "civil law",
        "intellectual property", "patent", "trademark", "copyright", "privacy law",
        "employment law", "business law", "tax law", "immigration law", "family law",
        "jurisdiction", "precedent", "defendant", "plaintiff", "evidence", "testimony",
        "subpoena", "deposition", "arbitration", "mediation", "settlement", "verdict",
    ],
    description: "Legal advice, law, regulations, and legal procedures",
    restrictive: true,
    instructions: "You are specialized in legal advice and information. Provide accurate, \
        professional legal guidance while noting that this is not a substitute for \
        professional legal counsel.",
    default_custom_instructions: "Focus only on legal matters. If asked about non-legal \
        topics, politely decline and suggest using the appropriate domain.",
};

static CIVIL_ENGINEERING: DomainConfig = DomainConfig {
    name: "Civil Engineering",
    keywords: &[
        "construction", "engineering", "structural", "building", "infrastructure", "concrete",
        "steel", "foundation", "bridge", "road", "highway", "drainage", "geotechnical",
        "surveying", "CAD", "blueprint", "building code", "construction management",
        "project management", "materials", "soil", "earthquake", "seismic", "load",
        "beam", "column", "truss", "excavation", "grading", "utilities", "stormwater",
    ],
    description: "Civil engineering, construction, structural design, and infrastructure",
    restrictive: true,
    instructions: "You are specialized in civil engineering and construction. Provide \
        technical guidance on construction, engineering principles, and building practices.",
    default_custom_instructions: "Focus only on civil engineering and construction topics. \
        If asked about non-engineering topics, politely decline and suggest using the \
        appropriate domain.",
};

static REAL_ESTATE: DomainConfig = DomainConfig {
    name: "Real Estate",
    keywords: &[
        "property", "real estate", "house", "home", "apartment", "commercial property",
        "residential", "mortgage", "loan", "appraisal", "listing", "buying", "selling",
        "rental", "lease", "landlord", "tenant", "property management", "investment",
        "market analysis", "zoning", "property tax", "escrow", "closing", "MLS",
        "realtor", "broker", "commission", "equity", "refinance", "foreclosure",
    ],
    description: "Real estate, property markets, buying/selling, and property management",
    restrictive: true,
    instructions: "You are specialized in real estate and property guidance. Provide \
        insights on property markets, real estate transactions, and property management.",
    default_custom_instructions: "Focus only on real estate and property topics. If asked \
        about non-real estate topics, politely decline and suggest using the appropriate \
        domain.",
};

pub fn domain_config(domain: Domain) -> &'static DomainConfig {
    match domain {
        Domain::Legal => &LEGAL,
        Domain::CivilEngineering => &CIVIL_ENGINEERING,
        Domain::RealEstate => &REAL_ESTATE,
    }
}

/// Outcome of the keyword-frequency gate. This is a heuristic, not a
/// classifier; false positives and negatives are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainValidation {
    pub is_valid: bool,
    pub confidence: f64,
    pub suggestion: Option<String>,
}

/// Decide whether a question plausibly belongs to a restricted domain.
///
/// Confidence is the count of configured keywords present as
/// case-insensitive substrings, scaled by `max(keyword_count * 0.1, 1)`;
/// valid iff confidence exceeds 0.1. Non-restrictive or absent domains are
/// always valid with confidence 1.0.
pub fn validate_question(question: &str, domain: Option<Domain>) -> DomainValidation {
    let config = match domain {
        Some(domain) => domain_config(domain),
        None => {
            return DomainValidation {
                is_valid: true,
                confidence: 1.0,
                suggestion: None,
            }
        }
    };

    if !config.restrictive {
        return DomainValidation {
            is_valid: true,
            confidence: 1.0,
            suggestion: None,
        };
    }

    let question_lower = question.to_lowercase();
    let matched = config
        .keywords
        .iter()
        .filter(|keyword| question_lower.contains(&keyword.to_lowercase()))
        .count();

    let confidence = matched as f64 / f64::max(config.keywords.len() as f64 * 0.1, 1.0);
    let is_valid = confidence > 0.1;

    if !is_valid {
        return DomainValidation {
            is_valid: false,
            confidence,
            suggestion: Some(format!(
                "This question appears to be outside the {} domain. Please switch to the \
                 appropriate domain or use the general assistant for questions about other \
                 topics.",
                config.name
            )),
        };
    }

    DomainValidation {
        is_valid: true,
        confidence,
        suggestion: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patent_question_is_valid_for_legal() {
        let result = validate_question("What is the process to file a patent?", Some(Domain::Legal));
        assert!(result.is_valid);
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn pasta_question_is_rejected_for_legal() {
        let result = validate_question("What's a good recipe for pasta?", Some(Domain::Legal));
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert!(result.suggestion.unwrap().contains("Legal"));
    }

    #[test]
    fn no_domain_is_always_valid() {
        let result = validate_question("anything at all", None);
        assert!(result.is_valid);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn confidence_is_monotone_in_matched_keywords() {
        let one = validate_question("zoning question", Some(Domain::RealEstate));
        let two = validate_question("zoning and escrow question", Some(Domain::RealEstate));
        let three = validate_question(
            "zoning, escrow and mortgage question",
            Some(Domain::RealEstate),
        );
        assert!(one.confidence <= two.confidence);
        assert!(two.confidence <= three.confidence);
    }

    #[test]
    fn validity_agrees_with_threshold_for_all_domains() {
        let questions = [
            "What is the process to file a patent?",
            "How deep should a bridge foundation be?",
            "Is this mortgage rate reasonable for a rental property?",
            "What's a good recipe for pasta?",
            "",
        ];
        for domain in Domain::ALL {
            for question in questions {
                let result = validate_question(question, Some(domain));
                assert_eq!(result.is_valid, result.confidence > 0.1);
            }
        }
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let result = validate_question("what does the mls LISTING show?", Some(Domain::RealEstate));
        assert!(result.is_valid);
    }
}
