use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Active,
    Maintained,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Maintained => "Maintained",
            ProjectStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(ProjectStatus::Active),
            "Maintained" => Ok(ProjectStatus::Maintained),
            "Archived" => Ok(ProjectStatus::Archived),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub tech: Vec<String>,
    pub year: i32,
    pub status: ProjectStatus,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<ProjectLink>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philosophy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<ProjectSection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,
}

impl Project {
    pub fn apply(&mut self, update: ProjectUpdate) {
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(tech) = update.tech {
            self.tech = tech;
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        if let Some(role) = update.role {
            self.role = Some(role).filter(|r| !r.is_empty());
        }
        if let Some(links) = update.links {
            self.links = Some(links);
        }
        if let Some(philosophy) = update.philosophy {
            self.philosophy = Some(philosophy).filter(|p| !p.is_empty());
        }
        if let Some(sections) = update.sections {
            self.sections = Some(sections);
        }
        if let Some(gallery) = update.gallery {
            self.gallery = Some(gallery);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    pub year: i32,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<ProjectLink>>,
    #[serde(default)]
    pub philosophy: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<ProjectSection>>,
    #[serde(default)]
    pub gallery: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech: Option<Vec<String>>,
    pub year: Option<i32>,
    pub status: Option<ProjectStatus>,
    pub featured: Option<bool>,
    pub role: Option<String>,
    pub links: Option<Vec<ProjectLink>>,
    pub philosophy: Option<String>,
    pub sections: Option<Vec<ProjectSection>>,
    pub gallery: Option<Vec<String>>,
}
