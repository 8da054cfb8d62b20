//! Three-step identity verification wizard built on the upload session.

use crate::analysis::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KycStep {
    PersonalDetails,
    VideoVerification,
    Confirmation,
}

impl KycStep {
    pub const ALL: [KycStep; 3] = [
        KycStep::PersonalDetails,
        KycStep::VideoVerification,
        KycStep::Confirmation,
    ];

    pub fn index(self) -> usize {
        match self {
            KycStep::PersonalDetails => 0,
            KycStep::VideoVerification => 1,
            KycStep::Confirmation => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            KycStep::PersonalDetails => "Personal Details",
            KycStep::VideoVerification => "Video Verification",
            KycStep::Confirmation => "Confirmation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            KycStep::PersonalDetails => "Please provide your personal information.",
            KycStep::VideoVerification => "Please record a 5-second video for verification.",
            KycStep::Confirmation => "Please review your information and submit.",
        }
    }

    /// Stack page name used by the wizard window.
    pub fn page_name(self) -> &'static str {
        match self {
            KycStep::PersonalDetails => "details",
            KycStep::VideoVerification => "video",
            KycStep::Confirmation => "confirm",
        }
    }

    fn next(self) -> Option<KycStep> {
        KycStep::ALL.get(self.index() + 1).copied()
    }

    fn previous(self) -> Option<KycStep> {
        self.index().checked_sub(1).map(|i| KycStep::ALL[i])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl PersonalDetails {
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && looks_like_email(&self.email)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

/// Outcome shown on the confirmation step.
#[derive(Debug, Clone, PartialEq)]
pub enum KycOutcome {
    Passed { fake_percentage: String },
    Failed { fake_percentage: String },
    Error(String),
}

impl KycOutcome {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let fake_percentage = result.percentage_text();
        if result.is_likely_deepfake {
            KycOutcome::Failed { fake_percentage }
        } else {
            KycOutcome::Passed { fake_percentage }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            KycOutcome::Passed { .. } => "Video Analysis Result",
            KycOutcome::Failed { .. } => "Deepfake Detected",
            KycOutcome::Error(_) => "Submission Failed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            KycOutcome::Passed { fake_percentage } => {
                format!("Fake Percentage: {fake_percentage}\nKYC verification passed.")
            }
            KycOutcome::Failed { fake_percentage } => {
                format!("Fake Percentage: {fake_percentage}\nKYC verification failed.")
            }
            KycOutcome::Error(message) => {
                format!("Error submitting KYC information. Record a new video to submit again.\n{message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KycWizard {
    step: KycStep,
    pub details: PersonalDetails,
}

impl Default for KycWizard {
    fn default() -> Self {
        Self {
            step: KycStep::PersonalDetails,
            details: PersonalDetails::default(),
        }
    }
}

impl KycWizard {
    pub fn step(&self) -> KycStep {
        self.step
    }

    pub fn heading(&self) -> String {
        format!(
            "KYC Verification - Step {} of {}",
            self.step.index() + 1,
            KycStep::ALL.len()
        )
    }

    /// Whether `step`'s requirements are met. `has_video` reports whether
    /// the session holds a recording or file.
    pub fn is_step_complete(&self, step: KycStep, has_video: bool) -> bool {
        match step {
            KycStep::PersonalDetails => self.details.is_complete(),
            KycStep::VideoVerification => has_video,
            KycStep::Confirmation => self.details.is_complete() && has_video,
        }
    }

    pub fn can_advance(&self, has_video: bool) -> bool {
        self.step.next().is_some() && self.is_step_complete(self.step, has_video)
    }

    pub fn can_go_back(&self, submitting: bool) -> bool {
        !submitting && self.step.previous().is_some()
    }

    pub fn can_submit(&self, has_video: bool, submitting: bool) -> bool {
        self.step == KycStep::Confirmation && !submitting && self.is_step_complete(self.step, has_video)
    }

    pub fn advance(&mut self, has_video: bool) -> bool {
        if !self.can_advance(has_video) {
            return false;
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        true
    }

    pub fn go_back(&mut self, submitting: bool) -> bool {
        if !self.can_go_back(submitting) {
            return false;
        }
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> KycWizard {
        KycWizard {
            step: KycStep::PersonalDetails,
            details: PersonalDetails {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
            },
        }
    }

    #[test]
    fn details_gate_the_first_step() {
        let mut wizard = KycWizard::default();
        assert!(!wizard.advance(true));
        assert_eq!(wizard.step(), KycStep::PersonalDetails);

        wizard.details.first_name = "Ada".into();
        wizard.details.last_name = "Lovelace".into();
        wizard.details.email = "not-an-email".into();
        assert!(!wizard.can_advance(true));

        wizard.details.email = "ada@example.com".into();
        assert!(wizard.advance(false));
        assert_eq!(wizard.step(), KycStep::VideoVerification);
        assert_eq!(wizard.heading(), "KYC Verification - Step 2 of 3");
    }

    #[test]
    fn video_gates_the_second_step() {
        let mut wizard = filled();
        wizard.advance(false);
        assert!(!wizard.advance(false));
        assert!(wizard.advance(true));
        assert_eq!(wizard.step(), KycStep::Confirmation);
        assert!(!wizard.can_advance(true));
    }

    #[test]
    fn submit_only_on_confirmation_when_idle() {
        let mut wizard = filled();
        assert!(!wizard.can_submit(true, false));
        wizard.advance(true);
        wizard.advance(true);
        assert!(wizard.can_submit(true, false));
        assert!(!wizard.can_submit(true, true));
        assert!(!wizard.can_submit(false, false));
    }

    #[test]
    fn back_is_blocked_on_first_step_and_while_submitting() {
        let mut wizard = filled();
        assert!(!wizard.go_back(false));
        wizard.advance(true);
        assert!(!wizard.go_back(true));
        assert!(wizard.go_back(false));
        assert_eq!(wizard.step(), KycStep::PersonalDetails);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email(" a@b "));
        assert!(!looks_like_email("@b"));
        assert!(!looks_like_email("a@"));
        assert!(!looks_like_email("a@b@c"));
        assert!(!looks_like_email("a b@c"));
    }

    #[test]
    fn outcome_follows_verdict() {
        let failed = KycOutcome::from_result(&AnalysisResult {
            fake_percentage: Some(91.0),
            is_likely_deepfake: true,
            top_frames: Vec::new(),
        });
        assert_eq!(failed.title(), "Deepfake Detected");
        assert_eq!(failed.message(), "Fake Percentage: 91.00%\nKYC verification failed.");

        let passed = KycOutcome::from_result(&AnalysisResult {
            fake_percentage: Some(2.5),
            is_likely_deepfake: false,
            top_frames: Vec::new(),
        });
        assert!(passed.message().ends_with("KYC verification passed."));
    }

    #[test]
    fn error_outcome_asks_for_a_new_recording() {
        let outcome = KycOutcome::Error("HTTP error! status: 503".into());
        assert_eq!(outcome.title(), "Submission Failed");
        let message = outcome.message();
        assert!(message.contains("Record a new video"));
        assert!(!message.contains("try again"));
        assert!(message.ends_with("HTTP error! status: 503"));
    }
}
