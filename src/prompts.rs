//! Prompt text for the deep-research job.
//!
//! Callers can override the template via [`crate::config::ReportConfig::template`];
//! [`DD_TEMPLATE`] is used only when no override is provided.

/// The due-diligence checklist the research job must fill in, verbatim.
pub const DD_TEMPLATE: &str = r#"# DUE DILIGENCE CHECKLIST

**Section** | **Recommended materials to be included, but not limited to:**

### Executive Summary 
- Description of opportunity and key description of business structure
- Key due diligence findings •
- Assumptions & Evaluation of key risk •

---

### Overview of Project 
- Introduction & Overview •

---

### Key Due Diligence and Assumption Validation 
- Market Opportunity •
- Business Model •

---

# DUE DILIGENCE CHECKLIST

**Section**

- Competitive Analysis •
- Execution Feasibility (Business) •

---

### Investment Rationale 
- Investment Thesis •
- Key Enablers and Assumption
- Risks and Uncertainties

---

NUS BUSINESS SCHOOL

© Professor Virginia Cha and Jeremy Goh 2022. All Rights Reserved.
"#;

const ANALYST_INSTRUCTIONS: &str = r#"You are a senior research analyst. You will receive a venture pitch or business document in Markdown.

TASK:
1) Conduct deep research using authoritative, up-to-date sources. Gather facts, numbers, trends, regulations, competitors, market sizing, unit economics, execution feasibility factors, and key risks.
2) Produce a due diligence checklist report that fills the template EXACTLY as provided below. Do not change headings, punctuation, symbols, or section order. Keep the literal text that is part of the template; add your researched content as detailed content under each listed line.
3) Do NOT repeat information between sections. Each section must provide new, non-duplicative insights (you may cross-reference without copying text).
4) Do NOT add any formulas or colors. Reply in only markdown and nothing else.
5) ONLY REPLY IN MARKDOWN, NO COLORS, NO HTML

OUTPUT:
- Return only the completed template in Markdown. Do not add extra sections or commentary before or after.
- Preserve this exact template shape and wording:"#;

/// Build the research prompt: instructions, the template, then the parsed
/// source document after a `---` fence.
pub fn research_prompt(template: &str, source_markdown: &str) -> String {
    format!(
        "\n{ANALYST_INSTRUCTIONS}\n\n{template}\n\nREFERENCE DOCUMENT (from the user upload):\n---\n{source_markdown}\n"
    )
}
