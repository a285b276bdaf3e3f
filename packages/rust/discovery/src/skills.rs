//! Skill bundle discovery.
//!
//! Every immediate subdirectory of the skills root that holds a `SKILL.md`
//! descriptor is a bundle. The descriptor's frontmatter supplies the name,
//! description, and an optional external reference URL.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use url::Url;

use docpack_markdown::{finish_description, first_paragraph, parse_frontmatter};
use docpack_shared::{DocpackError, Result, SkillEntry, artifact};

/// A skill bundle found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSkill {
    /// Index entry for `skills-index.json`.
    pub entry: SkillEntry,
    /// Absolute or root-relative skill directory.
    pub dir: PathBuf,
}

/// Find all skill bundles under `skills_root`, sorted by directory name.
///
/// `base_url`, when given, supplies `external_reference_url` for skills whose
/// descriptor does not name one.
#[instrument(skip_all, fields(root = %skills_root.display()))]
pub fn discover_skills(skills_root: &Path, base_url: Option<&Url>) -> Result<Vec<DiscoveredSkill>> {
    if !skills_root.is_dir() {
        return Err(DocpackError::missing_root("skills", skills_root));
    }

    let read_dir =
        std::fs::read_dir(skills_root).map_err(|e| DocpackError::io(skills_root, e))?;

    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| DocpackError::io(skills_root, e))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_dir() && !hidden {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut skills = Vec::new();
    for dir in dirs {
        let descriptor = dir.join(artifact::SKILL_DESCRIPTOR);
        if !descriptor.is_file() {
            debug!(dir = %dir.display(), "no skill descriptor, skipping directory");
            continue;
        }

        let text =
            std::fs::read_to_string(&descriptor).map_err(|e| DocpackError::io(&descriptor, e))?;
        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entry = skill_entry(&id, &text, base_url);
        debug!(id = %entry.id, name = %entry.name, "discovered skill");
        skills.push(DiscoveredSkill { entry, dir });
    }

    info!(count = skills.len(), "skill discovery complete");
    Ok(skills)
}

/// Look up a discovered skill by id (directory name) or descriptor name.
pub fn find_skill<'a>(skills: &'a [DiscoveredSkill], name: &str) -> Result<&'a DiscoveredSkill> {
    skills
        .iter()
        .find(|s| s.entry.id == name || s.entry.name == name)
        .ok_or_else(|| DocpackError::SkillNotFound {
            name: name.to_string(),
        })
}

/// Build the index entry for one descriptor.
fn skill_entry(id: &str, descriptor: &str, base_url: Option<&Url>) -> SkillEntry {
    let fm = parse_frontmatter(descriptor);

    let name = fm.get("name").unwrap_or(id).to_string();

    let description = match fm.get("description") {
        Some(d) => d.to_string(),
        None => match first_paragraph(fm.body) {
            Some(p) => finish_description(&p),
            None => {
                warn!(skill = id, "skill descriptor has no description, using fallback");
                format!("Reference bundle for {name}.")
            }
        },
    };

    let external_reference_url = fm
        .get("reference_url")
        .or_else(|| fm.get("url"))
        .map(str::to_string)
        .or_else(|| {
            base_url
                .and_then(|base| base.join(&format!("skills/{id}")).ok())
                .map(|u| u.to_string())
        });

    SkillEntry {
        id: id.to_string(),
        name,
        description,
        path: id.to_string(),
        external_reference_url,
    }
}
