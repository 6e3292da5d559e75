#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use crate::config::UploadConfig;
use crate::core::record::TaskRecord;

const IMPORT_PAGE: &str = include_str!("../../templates/import_page.html");

/// Everything the upload page needs besides the template itself.
#[derive(Debug, Clone)]
pub struct UploadPage<'a> {
    pub upload: &'a UploadConfig,
    pub source_name: &'a str,
    pub records: &'a [TaskRecord],
}

impl UploadPage<'_> {
    pub fn render(&self) -> anyhow::Result<String> {
        let mut vars: BTreeMap<&str, String> = BTreeMap::new();
        vars.insert("title", escape_html(&self.upload.title));
        vars.insert("source_name", escape_html(self.source_name));
        vars.insert("task_count", self.records.len().to_string());
        vars.insert("config_script", escape_html(&self.upload.config_script));
        vars.insert("app_page", escape_html(&self.upload.app_page));
        vars.insert("batch_size", self.upload.batch_size.max(1).to_string());
        vars.insert("batch_delay_ms", self.upload.batch_delay_ms.to_string());
        vars.insert("collection_js", script_json(&self.upload.collection)?);
        vars.insert("config_script_js", script_json(&self.upload.config_script)?);
        vars.insert("tasks_json", script_json(self.records)?);
        Ok(render_template(IMPORT_PAGE, &vars))
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let html = self.render()?;
        super::write_atomic(path, html.as_bytes())
    }
}

/// Replaces `{{name}}` tokens in one pass, so substituted text is never
/// rescanned. Unknown tokens are left as-is.
#[must_use]
pub fn render_template(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let Ok(re) = Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}") else {
        return template.to_owned();
    };
    re.replace_all(template, |caps: &regex::Captures<'_>| {
        vars.get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_owned())
    })
    .into_owned()
}

#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON literal that is safe inside a `<script>` element. `<` only occurs
/// inside JSON strings, where `\/` and `\u0021` are valid escapes.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let json = serde_json::to_string_pretty(value)?;
    Ok(json
        .replace("</", "<\\/")
        .replace("<!--", "<\\u0021--")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Frequency, TaskType};
    use time::macros::date;

    fn records() -> Vec<TaskRecord> {
        vec![TaskRecord::imported(
            77,
            "PPM for Panel </script><b> at {{title}}".to_owned(),
            TaskType::Service,
            Frequency::Monthly,
            date!(2024 - 02 - 01),
        )]
    }

    #[test]
    fn template_substitution_is_single_pass() {
        let mut vars = BTreeMap::new();
        vars.insert("a", "{{b}}".to_owned());
        vars.insert("b", "x".to_owned());
        assert_eq!(render_template("{{a}}-{{ b }}-{{c}}", &vars), "{{b}}-x-{{c}}");
    }

    #[test]
    fn page_embeds_records_and_upload_settings() {
        let upload = UploadConfig::default();
        let recs = records();
        let page = UploadPage {
            upload: &upload,
            source_name: "Site <North>.xlsx",
            records: &recs,
        };
        let html = page.render().unwrap();

        assert!(html.contains("<title>Import Tasks - AGL Tracking</title>"));
        assert!(html.contains("Site &lt;North&gt;.xlsx"));
        assert!(html.contains("const BATCH_SIZE = 10;"));
        assert!(html.contains("const BATCH_DELAY_MS = 100;"));
        assert!(html.contains(r#"firebase.database().ref("ppmTasks")"#));
        assert!(html.contains(r#"<script src="firebase-config.js"></script>"#));
        assert!(html.contains("\"id\": 77"));
        // The description cannot close the script block or pick up tokens.
        assert!(html.contains("PPM for Panel <\\/script><b> at {{title}}"));
        assert!(!html.contains("{{tasks_json}}"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn comment_openers_cannot_enter_script_data_escape() {
        let recs = vec![TaskRecord::imported(
            5,
            "Check <!-- <script> panel".to_owned(),
            TaskType::Inspection,
            Frequency::Weekly,
            date!(2024 - 02 - 01),
        )];
        let json = script_json(&recs).unwrap();
        assert!(!json.contains("<!--"));
        assert!(json.contains(r"Check <\u0021-- <script> panel"));
        let back: Vec<TaskRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, recs);
    }

    #[test]
    fn embedded_json_parses_back_to_the_records() {
        let upload = UploadConfig::default();
        let recs = records();
        let html = UploadPage {
            upload: &upload,
            source_name: "s.csv",
            records: &recs,
        }
        .render()
        .unwrap();

        let start = html.find("const tasksToImport = ").unwrap() + "const tasksToImport = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        let parsed: Vec<TaskRecord> =
            serde_json::from_str(&html[start..end].replace("<\\/", "</")).unwrap();
        assert_eq!(parsed, recs);
    }

    #[test]
    fn writes_page_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("import_tasks.html");
        let upload = UploadConfig::default();
        UploadPage {
            upload: &upload,
            source_name: "s.csv",
            records: &[],
        }
        .write(&path)
        .unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("const tasksToImport = [];"));
        assert!(html.contains("Ready to import:</strong> 0 PPM tasks"));
    }
}
