//! プロンプト生成モジュール
//!
//! - SYSTEM_INSTRUCTION: 欠陥カテゴリと出力JSON形式の指示
//! - USER_INSTRUCTION: 画像に添える指示
//! - build_prompt: 両者を結合したテキストパート

/// 欠陥検出のシステム指示
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert industrial defect detection AI. Analyze images for manufacturing and industrial defects like:
- Cold joints in welds
- Foreign materials/contaminants
- Cracks and fractures
- Corrosion and rust
- Surface imperfections
- Misaligned components
- Dimensional issues

Return ONLY a valid JSON response with this exact structure:
{
    "defects_found": [
        {
            "defect_type": "Cold Joint",
            "confidence": 92,
            "severity": "High",
            "description": "Incomplete weld penetration detected in joint area"
        },
        {
            "defect_type": "Foreign Material",
            "confidence": 86,
            "severity": "Medium",
            "description": "Metallic debris embedded in surface"
        }
    ],
    "total_defects": 2
}

If no defects are found, return:
{
    "defects_found": [],
    "total_defects": 0
}"#;

/// 画像に添えるユーザー指示
pub const USER_INSTRUCTION: &str =
    "Analyze this manufacturing/industrial image for defects. Return JSON response only.";

/// システム指示とユーザー指示を結合
///
/// システム指示が空の場合はユーザー指示のみ
pub fn build_prompt(system: &str, user: &str) -> String {
    let system = system.trim();
    if system.is_empty() {
        return user.to_string();
    }
    format!("{}\n\n{}", system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_joins_with_blank_line() {
        let prompt = build_prompt(SYSTEM_INSTRUCTION, USER_INSTRUCTION);
        assert!(prompt.starts_with("You are an expert industrial defect detection AI."));
        assert!(prompt.ends_with(USER_INSTRUCTION));
        assert!(prompt.contains("}\n\nAnalyze this"));
    }

    #[test]
    fn test_build_prompt_empty_system() {
        assert_eq!(build_prompt("   ", USER_INSTRUCTION), USER_INSTRUCTION);
    }

    #[test]
    fn test_system_instruction_lists_categories() {
        for category in [
            "Cold joints",
            "Foreign materials",
            "Cracks",
            "Corrosion",
            "Surface imperfections",
            "Misaligned components",
            "Dimensional issues",
        ] {
            assert!(SYSTEM_INSTRUCTION.contains(category), "missing: {}", category);
        }
        assert!(SYSTEM_INSTRUCTION.contains("\"total_defects\": 0"));
    }
}
