// Prompt constants for digest generation.

/// System prompt for the digest call.
pub const DIGEST_SYSTEM: &str = "You are a meticulous career assistant helping a job seeker. \
    You filter job alerts, group duplicate postings, summarize roles, \
    and tailor the candidate's resume to each role.";

/// Digest prompt template. Replace `{master_resume}`, `{job_text}`, `{rule}`,
/// `{factual_instruction}` and `{plain_text_instruction}` before sending.
pub const DIGEST_PROMPT_TEMPLATE: &str = r#"You have the candidate's MASTER RESUME and a list of JOB POSTINGS from job alert emails.

MASTER RESUME:
---
{master_resume}
---

JOB POSTINGS (text — url format):
{job_text}

TASK:
1. Filter: Keep ONLY computer science/software jobs in Utah OR remote roles available in Utah. Ignore non-technical jobs, career advice, recruiter spam.
2. Group: When the same job (same role, same company) appears on multiple sites, treat it as ONE job and list all of its links.
3. For EACH qualifying job: output the job details (title, company, location, links), a brief JOB SUMMARY, then a TAILORED VERSION of the master resume for that specific job.

For each job summary:
- Write 2-4 sentences summarizing the role, key requirements, and why it might be a good fit for this candidate
- Base it on the job posting content; be specific and concise

For each tailored resume:
- Modify the professional summary to emphasize fit for that role
- Reorder and emphasize relevant bullet points and skills
- Adjust keyword emphasis to match the posting
- Maintain standard resume structure (contact, summary, experience, skills, education)

{factual_instruction}

OUTPUT FORMAT (repeat for each job):

{rule}
JOB: [Title] at [Company] — [Location]
Links:
- [url 1]
- [url 2] (if same job on multiple sites)
{rule}

JOB SUMMARY:
[2-4 sentence summary of the role, key requirements, and fit for this candidate]

TAILORED RESUME:
[Full tailored resume for this job — use the same sections as the master resume]

{rule}

{plain_text_instruction}
"#;
