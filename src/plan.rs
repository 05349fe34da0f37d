//! 治疗方案清洗与咨询师回复渲染
//!
//! 模型给出的 treatment_plan 常带序号、项目符号，结束语「How does this sound to you?」
//! 也可能混在任意一条里。normalize_treatment_plan 把它们清洗成纯文本条目，结束语单独返回，
//! 由 render_counselor 在编号列表之后追加。

use std::sync::OnceLock;

use regex::Regex;

use crate::agents::CounselorResult;

/// 标准结束语
pub const DEFAULT_CLOSING_LINE: &str = "How does this sound to you?";

/// 清洗结果：条目不含结束语，结束语单独给出
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedPlan {
    pub items: Vec<String>,
    pub closing_line: Option<String>,
}

struct PlanPatterns {
    numeric_marker: Regex,
    bullet_marker: Regex,
    closing: Regex,
    multi_space: Regex,
    dangling_punct: Regex,
}

fn patterns() -> &'static PlanPatterns {
    static PATTERNS: OnceLock<PlanPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PlanPatterns {
        numeric_marker: Regex::new(r"^\s*\d+\s*[.)]\s*").expect("valid regex"),
        bullet_marker: Regex::new(r"^\s*[-•*]\s*").expect("valid regex"),
        closing: Regex::new(r"(?i)how does this sound to you\??").expect("valid regex"),
        multi_space: Regex::new(r"\s{2,}").expect("valid regex"),
        dangling_punct: Regex::new(r"\s*[.,;:]$").expect("valid regex"),
    })
}

/// 去掉开头的「1.」「2)」或「-」「•」「*」标记（只处理字符串开头）
fn strip_leading_marker(text: &str) -> String {
    let p = patterns();
    let text = p.numeric_marker.replace(text, "");
    p.bullet_marker.replace(&text, "").into_owned()
}

/// 移除第一处结束语；返回 (剩余文本, 是否含结束语)
fn remove_closing_line(text: &str) -> (String, bool) {
    let p = patterns();
    if !p.closing.is_match(text) {
        return (text.to_string(), false);
    }

    let without = p.closing.replace(text, "");
    let collapsed = p.multi_space.replace_all(&without, " ");
    let trimmed = collapsed.trim();
    let stripped = p.dangling_punct.replace(trimmed, "");
    (stripped.trim().to_string(), true)
}

/// 清洗治疗方案条目
///
/// - 逐条去序号 / 项目符号、去结束语，清洗后为空的条目丢弃，保持相对顺序
/// - 任一条目含结束语即记录标准结束语（只记第一次，之后的仅删除）
/// - 未出现结束语、`enforce_closing` 为 true 且至少保留一条时，补上标准结束语
pub fn normalize_treatment_plan<S: AsRef<str>>(items: &[S], enforce_closing: bool) -> NormalizedPlan {
    let mut cleaned = Vec::with_capacity(items.len());
    let mut closing_line: Option<String> = None;

    for raw in items {
        let text = strip_leading_marker(raw.as_ref());
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let (without_closing, had_closing) = remove_closing_line(text);
        if had_closing && closing_line.is_none() {
            closing_line = Some(DEFAULT_CLOSING_LINE.to_string());
        }

        if !without_closing.is_empty() {
            cleaned.push(without_closing);
        }
    }

    if closing_line.is_none() && enforce_closing && !cleaned.is_empty() {
        closing_line = Some(DEFAULT_CLOSING_LINE.to_string());
    }

    NormalizedPlan {
        items: cleaned,
        closing_line,
    }
}

/// 渲染咨询师结果为展示文本
///
/// Answer 模式直接返回答案；Plan 模式输出 ASSESSMENT / TREATMENT_PLAN（1 起编号 + 结束语）/ FOLLOW_UP，
/// 段落之间空一行，内容为空的段落省略。
pub fn render_counselor(result: &CounselorResult) -> String {
    match result {
        CounselorResult::Answer { answer } => answer.clone(),
        CounselorResult::Plan {
            assessment,
            treatment_plan,
            follow_up,
        } => {
            let normalized = normalize_treatment_plan(treatment_plan, true);
            let mut plan_lines: Vec<String> = normalized
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, item))
                .collect();
            if let Some(closing) = normalized.closing_line {
                plan_lines.push(closing);
            }

            let mut sections = Vec::new();
            if !assessment.trim().is_empty() {
                sections.push(format!("ASSESSMENT:\n{}", assessment.trim()));
            }
            if !plan_lines.is_empty() {
                sections.push(format!("TREATMENT_PLAN:\n{}", plan_lines.join("\n")));
            }
            if !follow_up.trim().is_empty() {
                sections.push(format!("FOLLOW_UP:\n{}", follow_up.trim()));
            }
            sections.join("\n\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_closing() {
        let empty: Vec<String> = vec![];
        assert_eq!(normalize_treatment_plan(&empty, true), NormalizedPlan::default());
    }

    #[test]
    fn test_strips_markers_and_extracts_closing() {
        let out = normalize_treatment_plan(&["1. Rest. How does this sound to you?", "2. Hydrate"], true);
        assert_eq!(out.items, vec!["Rest", "Hydrate"]);
        assert_eq!(out.closing_line.as_deref(), Some(DEFAULT_CLOSING_LINE));
    }

    #[test]
    fn test_bullets_and_paren_markers() {
        let out = normalize_treatment_plan(&["- Drink water", "• Sleep early", "3) Take ibuprofen", "* Stretch"], false);
        assert_eq!(out.items, vec!["Drink water", "Sleep early", "Take ibuprofen", "Stretch"]);
        assert_eq!(out.closing_line, None);
    }

    #[test]
    fn test_enforce_closing_synthesizes_line() {
        let out = normalize_treatment_plan(&["Rest"], true);
        assert_eq!(out.closing_line.as_deref(), Some(DEFAULT_CLOSING_LINE));
        let out = normalize_treatment_plan(&["Rest"], false);
        assert_eq!(out.closing_line, None);
    }

    #[test]
    fn test_enforce_closing_needs_surviving_item() {
        let out = normalize_treatment_plan(&["", "  ", "2. "], true);
        assert!(out.items.is_empty());
        assert_eq!(out.closing_line, None);
    }

    #[test]
    fn test_closing_only_item_is_dropped() {
        let out = normalize_treatment_plan(&["Rest", "how does this sound to you"], false);
        assert_eq!(out.items, vec!["Rest"]);
        assert_eq!(out.closing_line.as_deref(), Some(DEFAULT_CLOSING_LINE));
    }

    #[test]
    fn test_closing_in_middle_collapses_spaces() {
        let out = normalize_treatment_plan(&["Rest  HOW DOES THIS SOUND TO YOU?  then hydrate"], false);
        assert_eq!(out.items, vec!["Rest then hydrate"]);
    }

    #[test]
    fn test_repeated_closing_removed_everywhere() {
        let out = normalize_treatment_plan(
            &["Rest. How does this sound to you?", "Hydrate, how does this sound to you?"],
            false,
        );
        assert_eq!(out.items, vec!["Rest", "Hydrate"]);
        assert_eq!(out.closing_line.as_deref(), Some(DEFAULT_CLOSING_LINE));
    }

    #[test]
    fn test_items_without_closing_keep_punctuation() {
        let out = normalize_treatment_plan(&["1. Rest for two days."], false);
        assert_eq!(out.items, vec!["Rest for two days."]);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let first = normalize_treatment_plan(&["1. Rest. How does this sound to you?", "2. Hydrate"], true);
        let mut again_input = first.items.clone();
        again_input.push(first.closing_line.clone().unwrap());
        let second = normalize_treatment_plan(&again_input, true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_plan_mode() {
        let result = CounselorResult::Plan {
            assessment: "Likely a tension headache.".into(),
            treatment_plan: vec![
                "1. Rest in a dark room".into(),
                "2. Drink water".into(),
                "3. Take acetaminophen. How does this sound to you?".into(),
            ],
            follow_up: "If this isn't improving in 3 days, please contact your doctor.".into(),
        };
        let text = render_counselor(&result);
        assert_eq!(
            text,
            "ASSESSMENT:\nLikely a tension headache.\n\n\
             TREATMENT_PLAN:\n1. Rest in a dark room\n2. Drink water\n3. Take acetaminophen\nHow does this sound to you?\n\n\
             FOLLOW_UP:\nIf this isn't improving in 3 days, please contact your doctor."
        );
    }

    #[test]
    fn test_render_plan_omits_empty_sections() {
        let result = CounselorResult::Plan {
            assessment: String::new(),
            treatment_plan: vec![],
            follow_up: "Check back tomorrow.".into(),
        };
        assert_eq!(render_counselor(&result), "FOLLOW_UP:\nCheck back tomorrow.");
    }

    #[test]
    fn test_render_answer_mode() {
        let result = CounselorResult::Answer {
            answer: "Yes, you can take it with food.".into(),
        };
        assert_eq!(render_counselor(&result), "Yes, you can take it with food.");
    }
}
