//! Prompt construction.
//!
//! Each run picks one [`ProblemDomain`] from a fixed catalogue and folds it,
//! together with the history context, into the idea-generation prompt.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A focus area the suggested project should level up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemDomain {
    pub name: &'static str,
    pub focus: &'static str,
    pub example: &'static str,
}

pub static PROBLEM_DOMAINS: [ProblemDomain; 5] = [
    ProblemDomain {
        name: "AI tooling",
        focus: "local LLMs, fine-tuning, embeddings, agents",
        example: "if cloning AI repos, suggest a small fine-tune",
    },
    ProblemDomain {
        name: "Web3",
        focus: "wallets, smart contracts, on-chain data",
        example: "a testnet faucet watcher that alerts on new deposits",
    },
    ProblemDomain {
        name: "M-Pesa hacks",
        focus: "Daraja API, payment automation, SMS and USSD flows",
        example: "an STK push wrapper that logs every callback",
    },
    ProblemDomain {
        name: "Chaos tools",
        focus: "fault injection, fuzzing, resilience drills",
        example: "a script that randomly kills and restarts local services",
    },
    ProblemDomain {
        name: "Cloud/Termux automation",
        focus: "CLI tooling, cron jobs, self-hosting from a phone",
        example: "a cron-driven backup of notes to a free-tier bucket",
    },
];

/// Uniform random choice over [`PROBLEM_DOMAINS`].
pub struct DomainSelector {
    rng: StdRng,
}

impl DomainSelector {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence of picks for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pick(&mut self) -> &'static ProblemDomain {
        PROBLEM_DOMAINS
            .choose(&mut self.rng)
            .unwrap_or(&PROBLEM_DOMAINS[0])
    }
}

/// The full idea-generation prompt.
pub fn build_prompt(context: &str, domain: &ProblemDomain) -> String {
    format!(
        "You are FocusLock: no-BS AI for a Kenyan CS student building in cloud/Termux.
User history: {context}

Suggest ONE buildable project (100-300 lines, Python/JS focus):
- Ties to history (e.g., {example}).
- Levels up skills: AI, web3, M-Pesa hacks, chaos tools.
- Focus area this round: {name} ({focus}).
- Real value: KSh hustle, portfolio, or fun exploit.
- Format:
Project: [Name]
Why: [1 sentence]
Stack: [pkg/tools]
Steps: 1. [cmd] 2. [cmd]
Time: 2-4h
Potential: [outcome]",
        example = domain.example,
        name = domain.name,
        focus = domain.focus,
    )
}

/// Wrap an idea for delivery. The idea text is kept verbatim.
pub fn format_message(idea: &str) -> String {
    format!("🔒 *FocusLock Ping*\n\n{idea}")
}

const TITLE_MAX_CHARS: usize = 80;

/// Short name for a generated idea, for the history entry.
///
/// Uses the `Project:` line when the model followed the format, otherwise the
/// first non-blank line.
pub fn project_title(idea: &str) -> String {
    let line = idea
        .lines()
        .map(|l| l.trim().trim_matches('*').trim())
        .find_map(|l| {
            l.strip_prefix("Project:")
                .map(|rest| rest.trim_matches(|c: char| c == '*' || c.is_whitespace()))
        })
        .filter(|t| !t.is_empty())
        .or_else(|| idea.lines().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("untitled idea");

    if line.chars().count() > TITLE_MAX_CHARS {
        let cut: String = line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
