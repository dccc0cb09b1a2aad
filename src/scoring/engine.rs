//! Questionnaire scoring

use std::collections::BTreeSet;

use super::plan::build_plan;
use super::{
    Category, Questionnaire, ScoreReport, Subscores, Tier, GAP_THRESHOLD, MAX_SUBSCORE,
    STRENGTH_THRESHOLD,
};

/// Score a questionnaire.
pub fn score(answers: &Questionnaire) -> ScoreReport {
    let challenges: BTreeSet<String> = answers.challenges.iter().map(|c| key(c)).collect();
    let website = website_quality(answers.website_url.as_deref());

    let subscores = Subscores {
        online_presence: online_presence(website, &answers.monthly_visitors),
        lead_generation: lead_generation(&answers.lead_gen_methods, &challenges),
        conversion_readiness: conversion_readiness(website, &challenges),
        growth_capacity: growth_capacity(&answers.budget, &answers.company_size, &challenges),
    };

    let score = subscores.total().min(100);
    let strengths = ranked(&subscores, |points| points >= STRENGTH_THRESHOLD, true);
    let gaps = ranked(&subscores, |points| points < GAP_THRESHOLD, false);
    let plan = build_plan(&subscores, &strengths, &gaps, &key(&answers.goal));

    ScoreReport {
        score,
        subscores,
        tier: Tier::for_score(score),
        strengths,
        gaps,
        plan,
    }
}

/// Categories passing `keep`, ordered by points (descending when
/// `strongest_first`), ties in [`Category::ALL`] order.
fn ranked(subscores: &Subscores, keep: impl Fn(u32) -> bool, strongest_first: bool) -> Vec<Category> {
    let mut picked: Vec<Category> = Category::ALL
        .iter()
        .copied()
        .filter(|c| keep(subscores.get(*c)))
        .collect();

    // sort_by_key is stable, so equal scores keep ALL order
    if strongest_first {
        picked.sort_by_key(|c| std::cmp::Reverse(subscores.get(*c)));
    } else {
        picked.sort_by_key(|c| subscores.get(*c));
    }
    picked
}

/// Normalized answer key
fn key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebsiteQuality {
    Missing,
    Plain,
    Secure,
}

fn website_quality(url: Option<&str>) -> WebsiteQuality {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return WebsiteQuality::Missing;
    };

    let lower = url.to_ascii_lowercase();
    let (secure, host) = if let Some(rest) = lower.strip_prefix("https://") {
        (true, rest)
    } else if let Some(rest) = lower.strip_prefix("http://") {
        (false, rest)
    } else {
        (false, lower.as_str())
    };

    let host = host.split('/').next().unwrap_or_default();
    let looks_like_host = host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !host.chars().any(char::is_whitespace);

    match (looks_like_host, secure) {
        (false, _) => WebsiteQuality::Missing,
        (true, true) => WebsiteQuality::Secure,
        (true, false) => WebsiteQuality::Plain,
    }
}

fn online_presence(website: WebsiteQuality, monthly_visitors: &str) -> u32 {
    let site = match website {
        WebsiteQuality::Missing => 0,
        WebsiteQuality::Plain => 8,
        WebsiteQuality::Secure => 10,
    };
    let traffic = match key(monthly_visitors).as_str() {
        "0-500" => 3,
        "500-2000" => 7,
        "2000-10000" => 11,
        "10000+" => 15,
        _ => 0,
    };
    (site + traffic).min(MAX_SUBSCORE)
}

fn lead_generation(methods: &[String], challenges: &BTreeSet<String>) -> u32 {
    let methods: BTreeSet<String> = methods.iter().map(|m| key(m)).collect();
    let points: u32 = methods
        .iter()
        .map(|m| match m.as_str() {
            "seo" => 6,
            "content_marketing" => 5,
            "email_marketing" => 5,
            "paid_ads" => 4,
            "social_media" => 3,
            "referrals" => 3,
            "networking" => 2,
            "events" => 2,
            _ => 0,
        })
        .sum();

    let penalty = if challenges.contains("not_enough_leads") { 3 } else { 0 };
    points.min(MAX_SUBSCORE).saturating_sub(penalty)
}

fn conversion_readiness(website: WebsiteQuality, challenges: &BTreeSet<String>) -> u32 {
    // Without a site there is little to convert on
    let base = match website {
        WebsiteQuality::Missing => 5,
        _ => MAX_SUBSCORE,
    };

    let penalty: u32 = challenges
        .iter()
        .map(|c| match c.as_str() {
            "low_conversion" => 8,
            "no_tracking" => 6,
            "outdated_website" => 6,
            "no_follow_up" => 5,
            "unclear_messaging" => 4,
            _ => 0,
        })
        .sum();

    base.saturating_sub(penalty)
}

fn growth_capacity(budget: &str, company_size: &str, challenges: &BTreeSet<String>) -> u32 {
    let budget = match key(budget).as_str() {
        "0-1000" => 2,
        "1000-5000" => 7,
        "5000-15000" => 11,
        "15000+" => 15,
        _ => 0,
    };
    let size = match key(company_size).as_str() {
        "solo" => 1,
        "2-10" => 4,
        "11-50" => 6,
        "51-200" => 8,
        "200+" => 10,
        _ => 0,
    };
    let penalty = if challenges.contains("no_time") { 4 } else { 0 };
    (budget + size).min(MAX_SUBSCORE).saturating_sub(penalty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong() -> Questionnaire {
        Questionnaire {
            website_url: Some("https://acme-plumbing.com".into()),
            role: "owner".into(),
            company_size: "51-200".into(),
            monthly_visitors: "10000+".into(),
            lead_gen_methods: vec![
                "seo".into(),
                "content_marketing".into(),
                "email_marketing".into(),
                "paid_ads".into(),
                "referrals".into(),
                "social_media".into(),
            ],
            challenges: vec![],
            budget: "15000+".into(),
            goal: "scale_operations".into(),
        }
    }

    #[test]
    fn test_empty_questionnaire_scores_minimum() {
        let report = score(&Questionnaire::default());
        assert_eq!(report.subscores.online_presence, 0);
        assert_eq!(report.subscores.lead_generation, 0);
        assert_eq!(report.subscores.conversion_readiness, 5);
        assert_eq!(report.subscores.growth_capacity, 0);
        assert_eq!(report.score, 5);
        assert_eq!(report.tier, Tier::Foundation);
        assert!(report.strengths.is_empty());
        // weakest first, ties in fixed order
        assert_eq!(
            report.gaps,
            vec![
                Category::OnlinePresence,
                Category::LeadGeneration,
                Category::GrowthCapacity,
                Category::ConversionReadiness,
            ]
        );
        assert_eq!(report.plan.len(), 3);
    }

    #[test]
    fn test_strong_questionnaire_is_established() {
        let report = score(&strong());
        assert_eq!(report.subscores.online_presence, 25);
        assert_eq!(report.subscores.lead_generation, 25);
        assert_eq!(report.subscores.conversion_readiness, 25);
        assert_eq!(report.subscores.growth_capacity, 23);
        assert_eq!(report.score, 98);
        assert_eq!(report.tier, Tier::Established);
        assert_eq!(
            report.strengths,
            vec![
                Category::OnlinePresence,
                Category::LeadGeneration,
                Category::ConversionReadiness,
                Category::GrowthCapacity,
            ]
        );
        assert!(report.gaps.is_empty());
    }

    #[test]
    fn test_score_is_deterministic() {
        let answers = strong();
        assert_eq!(score(&answers), score(&answers));
    }

    #[test]
    fn test_score_equals_sum_of_subscores() {
        let mut answers = strong();
        answers.challenges = vec!["low_conversion".into(), "no_time".into()];
        answers.monthly_visitors = "500-2000".into();
        let report = score(&answers);
        assert_eq!(report.score, report.subscores.total());
        assert!(report.score <= 100);
    }

    #[test]
    fn test_answers_are_case_and_whitespace_insensitive() {
        let mut shouty = strong();
        shouty.monthly_visitors = " 10000+ ".into();
        shouty.lead_gen_methods = shouty
            .lead_gen_methods
            .iter()
            .map(|m| m.to_uppercase())
            .collect();
        shouty.budget = "15000+".into();
        assert_eq!(score(&shouty).subscores, score(&strong()).subscores);
    }

    #[test]
    fn test_duplicate_methods_count_once() {
        let mut answers = Questionnaire::default();
        answers.lead_gen_methods = vec!["seo".into(), "seo".into(), "SEO".into()];
        assert_eq!(score(&answers).subscores.lead_generation, 6);
    }

    #[test]
    fn test_penalties_saturate_at_zero() {
        let mut answers = Questionnaire::default();
        answers.challenges = vec![
            "low_conversion".into(),
            "no_tracking".into(),
            "not_enough_leads".into(),
            "no_time".into(),
        ];
        let report = score(&answers);
        assert_eq!(report.subscores.conversion_readiness, 0);
        assert_eq!(report.subscores.lead_generation, 0);
        assert_eq!(report.subscores.growth_capacity, 0);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn test_website_quality() {
        assert_eq!(website_quality(None), WebsiteQuality::Missing);
        assert_eq!(website_quality(Some("  ")), WebsiteQuality::Missing);
        assert_eq!(website_quality(Some("not a site")), WebsiteQuality::Missing);
        assert_eq!(website_quality(Some("example.com")), WebsiteQuality::Plain);
        assert_eq!(website_quality(Some("http://example.com/x")), WebsiteQuality::Plain);
        assert_eq!(website_quality(Some("HTTPS://Example.com")), WebsiteQuality::Secure);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::for_score(0), Tier::Foundation);
        assert_eq!(Tier::for_score(39), Tier::Foundation);
        assert_eq!(Tier::for_score(40), Tier::Developing);
        assert_eq!(Tier::for_score(69), Tier::Developing);
        assert_eq!(Tier::for_score(70), Tier::Established);
        assert_eq!(Tier::for_score(100), Tier::Established);
    }

    #[test]
    fn test_middle_band_is_neither_strength_nor_gap() {
        let answers = Questionnaire {
            website_url: Some("https://example.com".into()),
            monthly_visitors: "0-500".into(),
            ..Default::default()
        };
        let report = score(&answers);
        // 10 + 3
        assert_eq!(report.subscores.online_presence, 13);
        assert!(!report.gaps.contains(&Category::OnlinePresence));
        assert!(!report.strengths.contains(&Category::OnlinePresence));
    }

    #[test]
    fn test_unknown_answers_score_below_every_listed_answer() {
        let lowest = Questionnaire {
            company_size: "solo".into(),
            monthly_visitors: "0-500".into(),
            budget: "0-1000".into(),
            lead_gen_methods: vec!["networking".into()],
            ..Default::default()
        };
        let unknown = Questionnaire {
            company_size: "a few".into(),
            monthly_visitors: "lots".into(),
            budget: "unsure".into(),
            lead_gen_methods: vec!["carrier_pigeon".into()],
            challenges: vec!["mercury_retrograde".into()],
            ..Default::default()
        };

        let lowest = score(&lowest);
        let unknown = score(&unknown);
        assert_eq!(unknown.subscores.online_presence, 0);
        assert_eq!(unknown.subscores.lead_generation, 0);
        assert_eq!(unknown.subscores.growth_capacity, 0);
        assert!(unknown.subscores.online_presence < lowest.subscores.online_presence);
        assert!(unknown.subscores.lead_generation < lowest.subscores.lead_generation);
        assert!(unknown.subscores.growth_capacity < lowest.subscores.growth_capacity);
        // An unrecognised challenge carries no penalty
        assert_eq!(unknown.subscores.conversion_readiness, 5);
    }
}
