//! Small utility helpers used across modules.

use std::sync::OnceLock;

use regex::Regex;

fn placeholder_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\{(\w+)\}").ok()).as_ref()
}

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values in a
/// single pass: substituted values are never scanned again, and unknown keys
/// are left as written.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let Some(re) = placeholder_re() else {
    return tpl.to_string();
  };
  re.replace_all(tpl, |caps: &regex::Captures| {
    let key = &caps[1];
    match pairs.iter().find(|(k, _)| *k == key) {
      Some((_, v)) => v.to_string(),
      None => caps[0].to_string(),
    }
  })
  .into_owned()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge model payloads. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = s.char_indices().map(|(i, _)| i).take_while(|i| *i <= max).last().unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

fn think_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?is)<think>.*?</think>").ok()).as_ref()
}

fn fence_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok()).as_ref()
}

fn choice_marker_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  // "A) ", "b. ", "(C) ", "1) ", "2. "
  RE.get_or_init(|| Regex::new(r"^\s*(?:\(?[A-Da-d1-4]\)|[A-Da-d1-4]\.)\s+").ok()).as_ref()
}

/// Remove `<think>...</think>` reasoning blocks some local models emit.
/// An unterminated `<think>` drops everything after it.
pub fn strip_think_tags(s: &str) -> String {
  let cleaned = match think_re() {
    Some(re) => re.replace_all(s, "").into_owned(),
    None => s.to_string(),
  };
  match cleaned.to_ascii_lowercase().find("<think>") {
    Some(idx) => cleaned[..idx].trim().to_string(),
    None => cleaned.trim().to_string(),
  }
}

/// Best-effort extraction of a JSON object from raw model text:
/// strips reasoning blocks and markdown fences, then slices from the first
/// `{` to the last `}`. Returns None when no braces are found.
pub fn extract_json_text(raw: &str) -> Option<String> {
  let text = strip_think_tags(raw);
  let text = match fence_re().and_then(|re| re.captures(&text)) {
    Some(caps) => caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
    None => text,
  };
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  if end < start {
    return None;
  }
  Some(text[start..=end].to_string())
}

/// Strip a leading "A) ", "1. ", "(b) " marker from a model-produced choice.
pub fn strip_choice_marker(choice: &str) -> String {
  match choice_marker_re() {
    Some(re) => re.replace(choice, "").trim().to_string(),
    None => choice.trim().to_string(),
  }
}

fn embedded_marker_re() -> Option<&'static Regex> {
  static RE: OnceLock<Option<Regex>> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?:^|\s)\(?([A-D1-4])\)\s").ok()).as_ref()
}

/// Cut a question at choices the model inlined into the text ("... A) 3 B) 4 ...").
/// Cuts only when a first and a second marker of the same family are present
/// ("A)" and "B)", or "1)" and "2)"); otherwise the text is kept.
pub fn cut_embedded_choices(question: &str) -> String {
  let Some(re) = embedded_marker_re() else {
    return question.trim().to_string();
  };
  for (first, second) in [("A", "B"), ("1", "2")] {
    let mut start = None;
    let mut saw_second = false;
    for caps in re.captures_iter(question) {
      let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else { continue };
      if marker.as_str() == first && start.is_none() {
        start = Some(whole.start());
      } else if marker.as_str() == second && start.is_some() {
        saw_second = true;
      }
    }
    if let (Some(idx), true) = (start, saw_second) {
      let head = question[..idx].trim();
      if !head.is_empty() {
        return head.to_string();
      }
    }
  }
  question.trim().to_string()
}

/// Lowercase, trim and collapse internal whitespace for lenient comparisons.
pub fn normalize_answer(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_values_are_inserted_verbatim() {
    let out = fill_template("{a} then {b} and {unknown}", &[("a", "{b}"), ("b", "two")]);
    assert_eq!(out, "{b} then two and {unknown}");
    assert_eq!(fill_template(r#"{"x": 1} {a}"#, &[("a", "ok")]), r#"{"x": 1} ok"#);
  }

  #[test]
  fn think_tags_are_removed() {
    assert_eq!(strip_think_tags("<think>hmm\nok</think>{\"a\":1}"), "{\"a\":1}");
    assert_eq!(strip_think_tags("{\"a\":1}<THINK>never closed"), "{\"a\":1}");
  }

  #[test]
  fn json_is_pulled_out_of_fences_and_chatter() {
    let raw = "Sure! Here it is:\n```json\n{\"question\": \"2+2?\"}\n```\nEnjoy.";
    assert_eq!(extract_json_text(raw).as_deref(), Some("{\"question\": \"2+2?\"}"));
    assert_eq!(extract_json_text("prefix {\"x\": {\"y\": 1}} suffix").as_deref(), Some("{\"x\": {\"y\": 1}}"));
    assert_eq!(extract_json_text("no json here"), None);
  }

  #[test]
  fn choice_markers_are_stripped() {
    assert_eq!(strip_choice_marker("A) 8"), "8");
    assert_eq!(strip_choice_marker("(c) Brown"), "Brown");
    assert_eq!(strip_choice_marker("2. Small"), "Small");
    assert_eq!(strip_choice_marker("12"), "12");
    assert_eq!(strip_choice_marker("A big dog"), "A big dog");
  }

  #[test]
  fn inlined_choices_are_cut_from_question() {
    assert_eq!(cut_embedded_choices("What is 2 + 2? A) 3 B) 4 C) 5 D) 6"), "What is 2 + 2?");
    assert_eq!(cut_embedded_choices("Which is bigger?\n(A) 7\n(B) 9"), "Which is bigger?");
    assert_eq!(cut_embedded_choices("Is plan A) the best?"), "Is plan A) the best?");
    assert_eq!(cut_embedded_choices("A) 3 B) 4"), "A) 3 B) 4");
    assert_eq!(cut_embedded_choices("Pick one: 1) cat 2) dog"), "Pick one:");
  }

  #[test]
  fn trunc_respects_char_boundaries() {
    let s = "ééééé";
    let t = trunc_for_log(s, 3);
    assert!(t.starts_with('é'));
    assert!(t.contains("10 bytes total"));
  }

  #[test]
  fn normalize_answer_is_case_and_space_insensitive() {
    assert_eq!(normalize_answer("  The Boy   plays "), "the boy plays");
  }
}
