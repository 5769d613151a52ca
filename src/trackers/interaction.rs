//! Click classification.
//!
//! A single click is checked against every interaction category in a fixed
//! precedence order, and can match several at once — a PDF link inside a
//! project card is both a `project_click` and a `resume_download`.

use crate::page::{ClickTarget, Region};

/// An interaction category matched by a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Click in a project card or question-answer button region.
    ProjectClick {
        element: String,
        text: Option<String>,
    },
    /// Click on a `mailto:` link; carries the bare address.
    EmailClick { email: String },
    /// Click on a PDF link or an element whose text mentions a resume.
    ResumeDownload,
    /// Click in a social-link region; carries the platform label.
    SocialClick { platform: String },
}

/// Classifies a click into zero or more interactions.
///
/// Categories are checked in order: project regions, `mailto:` links, PDF
/// or resume-labelled links, social regions. Matching is independent per
/// category.
#[must_use]
pub fn classify(target: &ClickTarget) -> Vec<Interaction> {
    let mut interactions = Vec::new();

    if target.in_region(Region::ProjectCard) || target.in_region(Region::QaButton) {
        interactions.push(Interaction::ProjectClick {
            element: target.tag.clone(),
            text: target.text.as_deref().map(|t| t.trim().to_string()),
        });
    }

    if let Some(email) = target
        .href
        .as_deref()
        .and_then(|href| href.strip_prefix("mailto:"))
    {
        interactions.push(Interaction::EmailClick {
            email: email.to_string(),
        });
    }

    let is_pdf = target
        .href
        .as_deref()
        .is_some_and(|href| href.to_lowercase().ends_with(".pdf"));
    let mentions_resume = target
        .text
        .as_deref()
        .is_some_and(|text| text.to_lowercase().contains("resume"));
    if is_pdf || mentions_resume {
        interactions.push(Interaction::ResumeDownload);
    }

    if target.in_region(Region::SocialLink) {
        let platform = target
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "social".to_string());
        interactions.push(Interaction::SocialClick { platform });
    }

    interactions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_anchor(href: &str, text: &str) -> ClickTarget {
        ClickTarget {
            tag: "A".to_string(),
            href: Some(href.to_string()),
            text: Some(text.to_string()),
            regions: Vec::new(),
        }
    }

    #[test]
    fn unclassified_click_yields_nothing() {
        let target = plain_anchor("https://example.dev/blog", "Blog");
        assert!(classify(&target).is_empty());
    }

    #[test]
    fn mailto_click_is_email_only() {
        let target = plain_anchor("mailto:me@example.dev", "Email me");
        let interactions = classify(&target);

        assert_eq!(
            interactions,
            vec![Interaction::EmailClick {
                email: "me@example.dev".to_string()
            }]
        );
        assert!(!interactions.contains(&Interaction::ResumeDownload));
    }

    #[test]
    fn pdf_link_is_resume_download() {
        let target = plain_anchor("/files/cv.pdf", "Download CV");
        assert_eq!(classify(&target), vec![Interaction::ResumeDownload]);
    }

    #[test]
    fn resume_text_matches_case_insensitively() {
        let target = plain_anchor("/files/cv", "My RESUME here");
        assert_eq!(classify(&target), vec![Interaction::ResumeDownload]);
    }

    #[test]
    fn resume_match_requires_pdf_or_text() {
        let target = plain_anchor("/files/cv.docx", "Curriculum vitae");
        assert!(classify(&target).is_empty());
    }

    #[test]
    fn project_region_click() {
        let target = ClickTarget {
            tag: "BUTTON".to_string(),
            href: None,
            text: Some("  View project  ".to_string()),
            regions: vec![Region::ProjectCard],
        };

        assert_eq!(
            classify(&target),
            vec![Interaction::ProjectClick {
                element: "BUTTON".to_string(),
                text: Some("View project".to_string()),
            }]
        );
    }

    #[test]
    fn qa_button_counts_as_project_click() {
        let target = ClickTarget {
            tag: "BUTTON".to_string(),
            href: None,
            text: None,
            regions: vec![Region::QaButton],
        };

        assert!(matches!(
            classify(&target).as_slice(),
            [Interaction::ProjectClick { .. }]
        ));
    }

    #[test]
    fn social_click_lowercases_platform() {
        let target = ClickTarget {
            tag: "A".to_string(),
            href: Some("https://github.com/someone".to_string()),
            text: Some("GitHub".to_string()),
            regions: vec![Region::SocialLink],
        };

        assert_eq!(
            classify(&target),
            vec![Interaction::SocialClick {
                platform: "github".to_string()
            }]
        );
    }

    #[test]
    fn social_click_without_text_falls_back() {
        let target = ClickTarget {
            tag: "svg".to_string(),
            href: None,
            text: None,
            regions: vec![Region::SocialLink],
        };

        assert_eq!(
            classify(&target),
            vec![Interaction::SocialClick {
                platform: "social".to_string()
            }]
        );
    }

    #[test]
    fn one_click_can_match_multiple_categories() {
        // A resume PDF linked from inside a project card.
        let target = ClickTarget {
            tag: "A".to_string(),
            href: Some("/files/resume.pdf".to_string()),
            text: Some("Resume".to_string()),
            regions: vec![Region::ProjectCard],
        };

        let interactions = classify(&target);
        assert_eq!(interactions.len(), 2);
        assert!(matches!(
            interactions[0],
            Interaction::ProjectClick { .. }
        ));
        assert_eq!(interactions[1], Interaction::ResumeDownload);
    }

    #[test]
    fn precedence_order_is_fixed() {
        // All four categories at once: project region, mailto href with
        // resume text, social region.
        let target = ClickTarget {
            tag: "A".to_string(),
            href: Some("mailto:resume@example.dev".to_string()),
            text: Some("resume".to_string()),
            regions: vec![Region::ProjectCard, Region::SocialLink],
        };

        let interactions = classify(&target);
        assert_eq!(interactions.len(), 4);
        assert!(matches!(interactions[0], Interaction::ProjectClick { .. }));
        assert!(matches!(interactions[1], Interaction::EmailClick { .. }));
        assert_eq!(interactions[2], Interaction::ResumeDownload);
        assert!(matches!(interactions[3], Interaction::SocialClick { .. }));
    }
}
