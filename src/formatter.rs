use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Image-store directory name the rebasing step recognizes. The output file
/// lives one level below the store, hence the `../` prefix.
const IMAGES_SUBDIR: &str = "generated_images";

fn image_ref_regex() -> Regex {
    // Non-greedy so malformed bracket syntax is silently skipped.
    Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("valid regex")
}

/// Replaces each `[IMAGE_<n>]` anchor that has a mapping entry with a
/// Markdown image reference. Anchors whose generation failed have no entry
/// and are dropped so the prose flows on without them.
pub fn apply_image_mapping(story_text: &str, mapping: &HashMap<String, String>) -> String {
    let anchor_re = Regex::new(r"\[(IMAGE_(\d+))\]").expect("valid regex");
    anchor_re
        .replace_all(story_text, |caps: &Captures| {
            match mapping.get(&caps[1]) {
                Some(path) => format!("![Illustration {}]({})", &caps[2], path),
                None => String::new(),
            }
        })
        .to_string()
}

/// Keeps alphanumerics, spaces, hyphens and underscores, collapses spaces to
/// underscores, truncates to 30 chars.
fn sanitize_title(title: &str) -> String {
    let safe: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();
    safe.trim().replace(' ', "_").chars().take(30).collect()
}

/// Timestamped filename fallback chain. Resolution is one second: two saves
/// within the same second collide and the later one overwrites the earlier.
fn build_filename(book_id: Option<&str>, book_title: Option<&str>, timestamp: &str) -> String {
    match (book_id, book_title) {
        (Some(id), Some(title)) => format!("{}_{}_{}.md", id, sanitize_title(title), timestamp),
        (Some(id), None) => format!("{}_story_{}.md", id, timestamp),
        _ => format!("story_{}.md", timestamp),
    }
}

/// Wraps the Markdown body in a book-like HTML layout. Single pass, order
/// matters: paths are rebased before images are wrapped, separators are
/// inserted before the outer container is added.
fn enhance_layout(content: &str) -> String {
    let image_re = image_ref_regex();

    // 1. Rebase image paths onto the relative image store.
    let content = image_re.replace_all(content, |caps: &Captures| {
        let alt = &caps[1];
        let path = &caps[2];
        let marker = format!("/{}/", IMAGES_SUBDIR);
        let rebased = if let Some(idx) = path.rfind(&marker) {
            let basename = &path[idx + marker.len()..];
            format!("../{}/{}", IMAGES_SUBDIR, basename)
        } else if path.starts_with(&format!("{}/", IMAGES_SUBDIR)) {
            format!("../{}", path)
        } else {
            path.to_string()
        };
        format!("![{}]({})", alt, rebased)
    });

    // 2. Present every image as a centered block.
    let content = image_re.replace_all(&content, |caps: &Captures| {
        format!(
            "\n<div style=\"text-align: center; margin: 40px 0;\">\n  \
             <img src=\"{}\" alt=\"{}\" style=\"max-width: 500px; width: 100%; \
             border-radius: 8px; box-shadow: 0 4px 6px rgba(0,0,0,0.1);\" />\n</div>\n",
            &caps[2], &caps[1]
        )
    });

    // 3. Horizontal rule before each Part/Episode heading; a rule created by
    //    a heading at the very start of the document is stripped below.
    let separator_re =
        Regex::new(r"(\n##\s+(?:Part|Episode)\s+\d+[^\n]*\n)").expect("valid regex");
    let content = separator_re.replace_all(&content, "\n---\n$1");
    let content = content.trim_start_matches(|c| c == '-' || c == '\n');

    // 4. Stage directions are authoring anchors, not reader content.
    let scene_re = Regex::new(r"\[SCENE\s*(?:START|CHANGE|END)\]").expect("valid regex");
    let content = scene_re.replace_all(content, "");

    // 5. Outer container plus closing footer.
    format!(
        "<div style=\"max-width: 800px; margin: 0 auto; padding: 40px 20px; \
         font-family: Georgia, serif; line-height: 1.8;\">\n\n{}\n\n\
         <div style=\"text-align: center; margin-top: 60px; padding-top: 20px; \
         border-top: 2px solid #ccc; color: #666;\">\n  <em>The End</em>\n</div>\n\n</div>",
        content
    )
}

/// Formats the story and writes it under `output_dir`, returning the
/// absolute path of the written file.
pub fn format_and_save(
    output_dir: &Path,
    markdown_content: &str,
    book_id: Option<&str>,
    book_title: Option<&str>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let filename = match filename {
        Some(name) => name.to_string(),
        None => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
            build_filename(book_id, book_title, &timestamp)
        }
    };

    let enhanced = enhance_layout(markdown_content);

    let file_path = output_dir.join(&filename);
    fs::write(&file_path, enhanced)
        .with_context(|| format!("Failed to write formatted story to {:?}", file_path))?;

    Ok(fs::canonicalize(&file_path)?)
}
