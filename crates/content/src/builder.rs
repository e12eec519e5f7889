//! Maps a [`ContentModel`] onto a [`LayoutFragment`].
//!
//! The mapping is pure: no I/O, no clock, no randomness. Entries are emitted in
//! the order the model lists them, sections with nothing to show are left out,
//! and optional fields that are absent or blank produce no node at all.

use log::debug;
use vellum_types::FontWeight;

use crate::fragment::{BoxStyle, Edges, FragmentNode, LayoutFragment, TextStyle};
use crate::model::{
    present, Certification, ContentModel, Education, Experience, Identity, Project, SkillCategory,
};
use crate::theme::Theme;

const ONGOING: &str = "Present";
const CONTACT_SEPARATOR: &str = " | ";

/// Builds a fragment with the default [`Theme`].
pub fn build(model: &ContentModel) -> LayoutFragment {
    ContentModelBuilder::default().build(model)
}

#[derive(Debug, Clone, Default)]
pub struct ContentModelBuilder {
    theme: Theme,
}

impl ContentModelBuilder {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn build(&self, model: &ContentModel) -> LayoutFragment {
        let mut nodes = Vec::new();
        nodes.push(self.header(&model.identity));
        nodes.push(FragmentNode::Rule {
            thickness: 2.0,
            color: self.theme.accent_color,
            margin: self.theme.section_gap / 2.0,
        });

        if let Some(summary) = non_blank(&model.identity.summary) {
            nodes.push(self.section(
                "summary",
                "Professional Summary",
                vec![self.text("summary-text", self.theme.body(), summary)],
            ));
        }
        if !model.experience.is_empty() {
            let entries = model.experience.iter().map(|e| self.experience(e)).collect();
            nodes.push(self.section("experience", "Experience", entries));
        }
        if !model.education.is_empty() {
            let entries = model.education.iter().map(|e| self.education(e)).collect();
            nodes.push(self.section("education", "Education", entries));
        }
        if !model.skills.is_empty() {
            let entries = model.skills.iter().map(|s| self.skills(s)).collect();
            nodes.push(self.section("skills", "Skills", entries));
        }
        if !model.projects.is_empty() {
            let entries = model.projects.iter().map(|p| self.project(p)).collect();
            nodes.push(self.section("projects", "Projects", entries));
        }
        if !model.certifications.is_empty() {
            let entries = model.certifications.iter().map(|c| self.certification(c)).collect();
            nodes.push(self.section("certifications", "Certifications", entries));
        }

        debug!("Built layout fragment with {} top-level nodes", nodes.len());
        LayoutFragment::new(nodes, self.theme.background, self.theme.page_padding)
    }

    fn header(&self, identity: &Identity) -> FragmentNode {
        let mut children = Vec::new();
        if let Some(src) = present(&identity.avatar) {
            children.push(FragmentNode::Image {
                class: "avatar".into(),
                src: src.to_string(),
                width: self.theme.avatar_size,
                height: self.theme.avatar_size,
            });
            children.push(FragmentNode::Spacer { height: 12.0 });
        }

        // Name and title are required; they render even when empty.
        children.push(self.text("name", self.theme.name(), identity.name.trim()));
        children.push(self.text("title", self.theme.headline(), identity.title.trim()));

        let contact = contact_line(identity);
        if !contact.is_empty() {
            children.push(self.text("contact", self.theme.muted(), &contact));
        }

        FragmentNode::Block {
            class: "header".into(),
            style: BoxStyle {
                margin_bottom: 8.0,
                ..BoxStyle::default()
            },
            children,
        }
    }

    fn section(&self, class: &str, title: &str, mut body: Vec<FragmentNode>) -> FragmentNode {
        let mut children = Vec::with_capacity(body.len() + 1);
        children.push(self.text("section-title", self.theme.section_title(), title));
        children.append(&mut body);
        FragmentNode::Block {
            class: class.to_string(),
            style: BoxStyle {
                margin_bottom: self.theme.section_gap,
                ..BoxStyle::default()
            },
            children,
        }
    }

    fn entry(&self, class: &str, children: Vec<FragmentNode>) -> FragmentNode {
        FragmentNode::Block {
            class: class.to_string(),
            style: BoxStyle {
                padding: Edges {
                    left: 12.0,
                    ..Edges::default()
                },
                margin_bottom: self.theme.entry_gap,
                border_left: Some((3.0, self.theme.accent_color)),
                ..BoxStyle::default()
            },
            children,
        }
    }

    fn experience(&self, exp: &Experience) -> FragmentNode {
        let dates = date_range(non_blank(&exp.start_date), present(&exp.end_date), true);
        let mut children = vec![self.split_row("role", exp.position.trim(), &dates)];

        let company = match present(&exp.location) {
            Some(loc) => format!("{} · {}", exp.company.trim(), loc),
            None => exp.company.trim().to_string(),
        };
        children.push(self.text("company", self.theme.emphasis(), &company));

        if let Some(desc) = present(&exp.description) {
            children.push(self.text("description", self.theme.body(), desc));
        }
        let highlights: Vec<String> = exp
            .highlights
            .iter()
            .filter_map(|h| non_blank(h).map(str::to_string))
            .collect();
        if !highlights.is_empty() {
            children.push(FragmentNode::BulletList {
                class: "highlights".into(),
                style: self.theme.body(),
                items: highlights,
            });
        }
        self.entry("experience-entry", children)
    }

    fn education(&self, edu: &Education) -> FragmentNode {
        let degree = match present(&edu.field) {
            Some(field) => format!("{} in {}", edu.degree.trim(), field),
            None => edu.degree.trim().to_string(),
        };
        let dates = date_range(present(&edu.start_date), present(&edu.end_date), false);
        let mut children = vec![
            self.split_row("degree", &degree, &dates),
            self.text("institution", self.theme.emphasis(), edu.institution.trim()),
        ];

        let mut extras = Vec::new();
        if let Some(gpa) = present(&edu.gpa) {
            extras.push(format!("GPA: {}", gpa));
        }
        if let Some(honors) = present(&edu.honors) {
            extras.push(format!("Honors: {}", honors));
        }
        if !extras.is_empty() {
            children.push(self.text("academic", self.theme.muted(), &extras.join(CONTACT_SEPARATOR)));
        }
        self.entry("education-entry", children)
    }

    fn skills(&self, category: &SkillCategory) -> FragmentNode {
        let bold = TextStyle {
            weight: FontWeight::Bold,
            ..self.theme.body()
        };
        let skills: Vec<&str> = category.skills.iter().filter_map(|s| non_blank(s)).collect();
        FragmentNode::Block {
            class: "skill-category".into(),
            style: BoxStyle {
                margin_bottom: self.theme.entry_gap / 2.0,
                ..BoxStyle::default()
            },
            children: vec![
                self.text("skill-name", bold, category.name.trim()),
                self.text("skill-list", self.theme.body(), &skills.join(", ")),
            ],
        }
    }

    fn project(&self, project: &Project) -> FragmentNode {
        let url = present(&project.url).unwrap_or_default();
        let mut children = vec![self.split_row("project-name", project.name.trim(), url)];
        if let Some(desc) = non_blank(&project.description) {
            children.push(self.text("description", self.theme.body(), desc));
        }
        let tech: Vec<&str> = project.technologies.iter().filter_map(|t| non_blank(t)).collect();
        if !tech.is_empty() {
            children.push(self.text(
                "technologies",
                self.theme.italic_muted(),
                &format!("Technologies: {}", tech.join(", ")),
            ));
        }
        self.entry("project-entry", children)
    }

    fn certification(&self, cert: &Certification) -> FragmentNode {
        let date = present(&cert.date).unwrap_or_default();
        let mut children = vec![
            self.split_row("cert-name", cert.name.trim(), date),
            self.text("issuer", self.theme.emphasis(), cert.issuer.trim()),
        ];
        if let Some(url) = present(&cert.url) {
            children.push(self.text("credential", self.theme.muted(), url));
        }
        self.entry("certification-entry", children)
    }

    fn text(&self, class: &str, style: TextStyle, text: &str) -> FragmentNode {
        FragmentNode::Text {
            class: class.to_string(),
            style,
            text: text.to_string(),
        }
    }

    fn split_row(&self, class: &str, left: &str, right: &str) -> FragmentNode {
        FragmentNode::SplitRow {
            class: class.to_string(),
            left: left.to_string(),
            left_style: self.theme.entry_title(),
            right: right.to_string(),
            right_style: self.theme.dates(),
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn contact_line(identity: &Identity) -> String {
    let fields = [
        non_blank(&identity.email),
        present(&identity.phone),
        present(&identity.location),
        present(&identity.website),
        present(&identity.linkedin),
        present(&identity.github),
    ];
    fields.into_iter().flatten().collect::<Vec<_>>().join(CONTACT_SEPARATOR)
}

/// `start - end`. A missing end date reads as "Present" when `open_ended` is set.
fn date_range(start: Option<&str>, end: Option<&str>, open_ended: bool) -> String {
    let end = end.or(if open_ended { Some(ONGOING) } else { None });
    match (start, end) {
        (Some(s), Some(e)) => format!("{} - {}", s, e),
        (Some(s), None) => s.to_string(),
        (None, Some(e)) => e.to_string(),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ContentModel {
        ContentModel::from_json(
            r#"{
                "identity": {
                    "name": "Amara Okafor",
                    "title": "Staff Engineer",
                    "summary": "Builds reliable systems.",
                    "email": "amara@example.com",
                    "phone": "",
                    "website": "amara.dev"
                },
                "experience": [
                    {"company": "Northwind", "position": "Staff Engineer", "startDate": "2021",
                     "highlights": ["Led the storage rewrite", "  "]},
                    {"company": "Contoso", "position": "Engineer", "startDate": "2017", "endDate": "2021",
                     "location": "Lagos"}
                ],
                "education": [
                    {"institution": "UNILAG", "degree": "BSc", "field": "Computer Science", "gpa": "4.8"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn building_twice_yields_the_same_text() {
        let m = model();
        let a = build(&m);
        let b = build(&m);
        assert_eq!(a.text_content(), b.text_content());
        assert_eq!(a.to_markup(), b.to_markup());
    }

    #[test]
    fn entries_keep_model_order() {
        let text = build(&model()).text_content();
        let first = text.iter().position(|t| t == "Northwind").unwrap();
        let second = text.iter().position(|t| t.starts_with("Contoso")).unwrap();
        assert!(first < second);
        assert!(text.contains(&"2021 - Present".to_string()));
        assert!(text.contains(&"2017 - 2021".to_string()));
        assert!(text.contains(&"Contoso · Lagos".to_string()));
    }

    #[test]
    fn absent_optionals_produce_no_placeholder() {
        let fragment = build(&model());
        let text = fragment.text_content();
        assert!(text.contains(&"amara@example.com | amara.dev".to_string()));
        assert!(text.contains(&"BSc in Computer Science".to_string()));
        assert!(text.contains(&"GPA: 4.8".to_string()));
        assert!(!text.iter().any(|t| t.contains("Honors")));
        assert!(!text.iter().any(|t| t == "Projects" || t == "Skills"));
        assert!(fragment.image_sources().is_empty());
    }

    #[test]
    fn blank_highlights_are_dropped() {
        let fragment = build(&model());
        let markup = fragment.to_markup();
        assert_eq!(markup.matches("<li>").count(), 1);
    }

    #[test]
    fn empty_identity_renders_best_effort() {
        let fragment = build(&ContentModel::default());
        assert_eq!(fragment.text_content(), vec!["", ""]);
        assert!(!fragment.is_empty());
    }

    #[test]
    fn avatar_is_listed_as_an_image_source() {
        let mut m = model();
        m.identity.avatar = Some("photos/amara.png".into());
        assert_eq!(build(&m).image_sources(), vec!["photos/amara.png"]);
    }

    #[test]
    fn date_range_formats() {
        assert_eq!(date_range(Some("2020"), None, true), "2020 - Present");
        assert_eq!(date_range(Some("2020"), None, false), "2020");
        assert_eq!(date_range(None, Some("2019"), false), "2019");
        assert_eq!(date_range(None, None, false), "");
    }
}
