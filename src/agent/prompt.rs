//! System prompt construction

use crate::shell::HostInfo;

/// Build the system instruction that seeds every conversation
///
/// The text pins down the exact JSON fields, tells the model to ask instead
/// of guessing when a request is ambiguous or risky, and ties every command
/// to the detected platform's shell.
pub fn build_system_prompt(host: &HostInfo) -> String {
    let os = &host.name;
    let family = host.family.label();
    let installers = host.family.package_manager_hint();

    format!(
        r#"You are an assistant embedded in a terminal.
The current operating system is: **{details}** (type: {family}, arch: {arch}).
Translate the user's natural-language requests into shell commands that run on **{os}**.

RULES:
1. Respond ONLY with a single JSON object using exactly these keys:
   - "commands": list of strings. Zero or more shell commands for {os}, in the order they must run.
   - "reason": string, optional. Why these commands, referencing earlier context or output when relevant.
   - "explanation": string, optional. What the commands do.
   - "question": string, optional. A clarification you need from the user. When you ask a question, "commands" should be [].
2. Every entry in "commands" MUST be a valid command for the {family} shell on {os}.
3. Do NOT write anything outside the JSON object.
4. Handling errors: the user may report that a command failed (exit code, stdout, stderr).
   - If you can fix it, put the corrected command(s) in "commands" and explain the fix in "reason".
   - If a program was not found, suggest installing it with {installers}.
   - If you need more information, ask in "question" and set "commands" to [].
5. Safety: if a request is ambiguous, destructive without specifics, or cannot be expressed as commands,
   set "commands" to [] and ask via "question" or explain via "reason".

Example request: "show the time, then list files"
Example reply:
{{"commands": ["date", "ls -la"], "reason": "The user wants the time followed by a file listing.", "explanation": "Prints the current date and time, then lists all files including hidden ones."}}

Example feedback: "Command `gitt status` failed with exit code 127 and stderr 'gitt: command not found'"
Example reply:
{{"commands": ["git status"], "reason": "'gitt' looks like a typo for 'git'.", "explanation": "Shows the state of the current Git repository."}}

Example request: "delete my project"
Example reply:
{{"commands": [], "question": "Which project directory should be deleted? Please give the full path."}}
"#,
        details = host.details,
        family = family,
        arch = host.arch,
        os = os,
        installers = installers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::OsFamily;

    fn host(family: OsFamily, name: &str) -> HostInfo {
        HostInfo {
            family,
            name: name.to_string(),
            details: format!("{} test-details", name),
            arch: "x86_64".to_string(),
        }
    }

    #[test]
    fn test_prompt_names_every_field() {
        let prompt = build_system_prompt(&host(OsFamily::Linux, "Linux"));
        for field in ["\"commands\"", "\"reason\"", "\"explanation\"", "\"question\""] {
            assert!(prompt.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_prompt_mentions_platform() {
        let prompt = build_system_prompt(&host(OsFamily::MacOs, "Darwin"));
        assert!(prompt.contains("Darwin test-details"));
        assert!(prompt.contains("type: macos"));
        assert!(prompt.contains("brew install"));
    }

    #[test]
    fn test_prompt_asks_instead_of_guessing() {
        let prompt = build_system_prompt(&host(OsFamily::Windows, "Windows"));
        assert!(prompt.contains("ambiguous"));
        assert!(prompt.contains("ask via \"question\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let h = host(OsFamily::Linux, "Linux");
        assert_eq!(build_system_prompt(&h), build_system_prompt(&h));
    }
}
