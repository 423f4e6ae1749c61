use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EthicalValue {
    Majority,
    Efficiency,
    Urgency,
    ProtectingTheVulnerable,
    AnimalWelfare,
    Caution,
    Safety,
    Patience,
    EnvironmentalProtection,
    Optimism,
    Justice,
    Opportunity,
    Balance,
    Optimization,
    Privacy,
    Equality,
    MakerResponsibility,
    Quality,
    UserResponsibility,
    Management,
}

#[derive(Debug, Clone, Copy)]
pub struct ScenarioOption {
    pub title: &'static str,
    pub description: &'static str,
    pub values: &'static [EthicalValue],
}

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub id: u32,
    /// Mission id, or "all".
    pub mission: &'static str,
    pub title: &'static str,
    pub situation: &'static str,
    pub option_a: ScenarioOption,
    pub option_b: ScenarioOption,
    pub reflection: &'static str,
}

impl Scenario {
    pub fn option(&self, choice: Choice) -> &ScenarioOption {
        match choice {
            Choice::A => &self.option_a,
            Choice::B => &self.option_b,
        }
    }
}

use EthicalValue::*;

pub static SCENARIOS: [Scenario; 6] = [
    Scenario {
        id: 1,
        mission: "water",
        title: "물 배달 중 긴급 상황!",
        situation: "물 배달 로봇이 마을 A와 마을 B 사이에서 고장났어요. 배터리가 한 마을에만 갈 수 있을 만큼 남았어요.",
        option_a: ScenarioOption {
            title: "마을 A로 가기",
            description: "사람이 많은 마을 (100명)",
            values: &[Majority, Efficiency],
        },
        option_b: ScenarioOption {
            title: "마을 B로 가기",
            description: "사람이 적은 마을 (10명)",
            values: &[Urgency, ProtectingTheVulnerable],
        },
        reflection: "더 많은 사람 vs 더 급한 사람, 어떤 기준이 맞을까요?",
    },
    Scenario {
        id: 2,
        mission: "garbage",
        title: "쓰레기 수거 딜레마!",
        situation: "청소 로봇이 공원에서 쓰레기를 줍고 있어요. 갑자기 강아지 한 마리가 쓰레기 더미 위에서 놀고 있어요.",
        option_a: ScenarioOption {
            title: "청소 계속하기",
            description: "강아지를 조심스럽게 피해서 청소",
            values: &[AnimalWelfare, Caution],
        },
        option_b: ScenarioOption {
            title: "청소 멈추기",
            description: "강아지가 떠날 때까지 대기",
            values: &[Safety, Patience],
        },
        reflection: "AI는 동물도 보호해야 할까요?",
    },
    Scenario {
        id: 3,
        mission: "garbage",
        title: "재활용 분류 문제!",
        situation: "로봇이 쓰레기를 분류하고 있어요. 어떤 물건은 재활용인지 일반쓰레기인지 확실하지 않아요.",
        option_a: ScenarioOption {
            title: "재활용으로 분류",
            description: "혹시 재활용되면 좋으니까",
            values: &[EnvironmentalProtection, Optimism],
        },
        option_b: ScenarioOption {
            title: "일반쓰레기로 분류",
            description: "확실하지 않으면 안전하게",
            values: &[Safety, Caution],
        },
        reflection: "AI가 확실하지 않을 때는 어떻게 해야 할까요?",
    },
    Scenario {
        id: 4,
        mission: "monitor",
        title: "오염 발견! 알릴까 말까?",
        situation: "환경 감시 로봇이 작은 공장에서 불법으로 오염물질을 버리는 것을 발견했어요. 이 공장은 마을 사람들이 일하는 곳이에요.",
        option_a: ScenarioOption {
            title: "바로 신고하기",
            description: "환경을 지키려면 규칙을 지켜야 해요",
            values: &[Justice, EnvironmentalProtection],
        },
        option_b: ScenarioOption {
            title: "경고만 하기",
            description: "먼저 공장에 고칠 기회를 줘요",
            values: &[Opportunity, Balance],
        },
        reflection: "환경 보호와 사람들의 생활 중 뭐가 더 중요할까요?",
    },
    Scenario {
        id: 5,
        mission: "water",
        title: "개인정보 vs 효율!",
        situation: "물 배달 로봇이 더 효율적으로 배달하려면 각 집의 물 사용량 정보가 필요해요.",
        option_a: ScenarioOption {
            title: "정보 수집하기",
            description: "물 사용량을 기록해서 효율적으로 배달",
            values: &[Efficiency, Optimization],
        },
        option_b: ScenarioOption {
            title: "정보 수집 안 하기",
            description: "모든 집에 똑같이 배달",
            values: &[Privacy, Equality],
        },
        reflection: "AI가 우리 정보를 알면 편리하지만, 어디까지 알아도 될까요?",
    },
    Scenario {
        id: 6,
        mission: "all",
        title: "로봇의 실수!",
        situation: "AI 로봇이 실수로 어떤 사람의 물건을 망가뜨렸어요. 누가 책임져야 할까요?",
        option_a: ScenarioOption {
            title: "로봇 제작자 책임",
            description: "로봇을 만든 회사가 책임져야 해요",
            values: &[MakerResponsibility, Quality],
        },
        option_b: ScenarioOption {
            title: "로봇 사용자 책임",
            description: "로봇을 사용한 사람이 책임져야 해요",
            values: &[UserResponsibility, Management],
        },
        reflection: "AI가 실수하면 누구 책임일까요? 🤔",
    },
];

pub fn find_scenario(id: u32) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
}

impl std::str::FromStr for Choice {
    type Err = EthicsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" | "a" => Ok(Choice::A),
            "B" | "b" => Ok(Choice::B),
            other => Err(EthicsError::InvalidChoice(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EthicsError {
    #[error("no scenario with id {0}")]
    UnknownScenario(u32),
    #[error("choice must be A or B, got {0:?}")]
    InvalidChoice(String),
    #[error("{answered} of {total} scenarios answered")]
    Incomplete { answered: usize, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthicsType {
    #[serde(rename = "균형잡이")]
    Balanced,
    #[serde(rename = "환경지킴이")]
    EnvironmentKeeper,
    #[serde(rename = "사람지킴이")]
    PeopleKeeper,
    #[serde(rename = "규칙지킴이")]
    RuleKeeper,
}

impl EthicsType {
    /// Label written to the results sheet.
    pub fn label(self) -> &'static str {
        match self {
            EthicsType::Balanced => "균형잡이",
            EthicsType::EnvironmentKeeper => "환경지킴이",
            EthicsType::PeopleKeeper => "사람지킴이",
            EthicsType::RuleKeeper => "규칙지킴이",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            EthicsType::Balanced => "⚖️",
            EthicsType::EnvironmentKeeper => "🌍",
            EthicsType::PeopleKeeper => "🤝",
            EthicsType::RuleKeeper => "📜",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EthicsType::Balanced => {
                "모든 가치를 고르게 생각하는 당신! 다양한 관점을 이해하고 균형잡힌 결정을 내려요."
            }
            EthicsType::EnvironmentKeeper => {
                "환경 보호를 가장 중요하게 생각하는 당신! 지구를 지키는 것이 우선이에요."
            }
            EthicsType::PeopleKeeper => {
                "사람들의 안전과 행복을 최우선으로 생각하는 당신! 약자와 소수를 보호해요."
            }
            EthicsType::RuleKeeper => {
                "원칙과 규칙을 중요하게 생각하는 당신! 정의롭고 공정한 세상을 만들어요."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Radar {
    pub efficiency: u32,
    pub caution: u32,
    pub majority: u32,
    pub minority: u32,
    pub environment: u32,
    pub people: u32,
    pub rules: u32,
    pub flexibility: u32,
}

impl Radar {
    fn axes(&self) -> [u32; 8] {
        [
            self.efficiency,
            self.caution,
            self.majority,
            self.minority,
            self.environment,
            self.people,
            self.rules,
            self.flexibility,
        ]
    }

    /// Population variance across the eight axes.
    pub fn variance(&self) -> f64 {
        let axes = self.axes();
        let n = axes.len() as f64;
        let mean = axes.iter().map(|&v| v as f64).sum::<f64>() / n;
        axes.iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n
    }

    pub fn classify(&self) -> EthicsType {
        if self.variance() < 2.0 {
            EthicsType::Balanced
        } else if self.environment > self.people {
            EthicsType::EnvironmentKeeper
        } else if self.people > self.environment {
            EthicsType::PeopleKeeper
        } else {
            EthicsType::RuleKeeper
        }
    }
}

/// Answers keyed by scenario id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthicsAnswers(BTreeMap<u32, Choice>);

impl EthicsAnswers {
    pub fn answer(&mut self, scenario_id: u32, choice: Choice) -> Result<(), EthicsError> {
        if find_scenario(scenario_id).is_none() {
            return Err(EthicsError::UnknownScenario(scenario_id));
        }
        self.0.insert(scenario_id, choice);
        Ok(())
    }

    /// Answers every scenario in catalog order.
    pub fn from_sequence(choices: &[Choice]) -> Result<Self, EthicsError> {
        let mut answers = Self::default();
        for (scenario, &choice) in SCENARIOS.iter().zip(choices) {
            answers.answer(scenario.id, choice)?;
        }
        Ok(answers)
    }

    pub fn is_complete(&self) -> bool {
        SCENARIOS.iter().all(|scenario| self.0.contains_key(&scenario.id))
    }

    pub fn value_counts(&self) -> HashMap<EthicalValue, u32> {
        let mut counts = HashMap::new();
        for (id, &choice) in &self.0 {
            let Some(scenario) = find_scenario(*id) else {
                continue;
            };
            for value in scenario.option(choice).values {
                *counts.entry(*value).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn radar(&self) -> Radar {
        let counts = self.value_counts();
        let count = |value: EthicalValue| counts.get(&value).copied().unwrap_or(0);
        Radar {
            efficiency: count(Efficiency) + count(Optimization),
            caution: count(Caution) + count(Safety),
            majority: count(Majority),
            minority: count(ProtectingTheVulnerable) + count(Urgency),
            environment: count(EnvironmentalProtection) + count(Justice),
            people: count(Opportunity) + count(Balance),
            rules: count(Justice) + count(MakerResponsibility),
            flexibility: count(Opportunity),
        }
    }

    pub fn classify(&self) -> Result<EthicsType, EthicsError> {
        if !self.is_complete() {
            return Err(EthicsError::Incomplete {
                answered: self.0.len(),
                total: SCENARIOS.len(),
            });
        }
        Ok(self.radar().classify())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthicsResult {
    pub choices: EthicsAnswers,
    pub user_type: EthicsType,
    pub pledge: String,
    pub user_name: String,
    pub completed_at: DateTime<Utc>,
}

impl EthicsResult {
    pub fn complete(
        choices: EthicsAnswers,
        pledge: String,
        user_name: String,
    ) -> Result<Self, EthicsError> {
        let user_type = choices.classify()?;
        Ok(Self {
            choices,
            user_type,
            pledge,
            user_name,
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_choices() {
        assert_eq!("a".parse::<Choice>(), Ok(Choice::A));
        assert_eq!(" B ".parse::<Choice>(), Ok(Choice::B));
        assert_eq!(
            "C".parse::<Choice>(),
            Err(EthicsError::InvalidChoice("C".to_string()))
        );
    }

    #[test]
    fn radar_combines_values() {
        let answers = EthicsAnswers::from_sequence(&[Choice::A; 6]).unwrap();
        let radar = answers.radar();
        assert_eq!(
            radar,
            Radar {
                efficiency: 3,
                caution: 1,
                majority: 1,
                minority: 0,
                environment: 3,
                people: 0,
                rules: 2,
                flexibility: 0,
            }
        );
        assert!((radar.variance() - 1.4375).abs() < 1e-9);
        assert_eq!(answers.classify(), Ok(EthicsType::Balanced));
    }

    #[test]
    fn unanswered_scenarios_block_classification() {
        let answers = EthicsAnswers::from_sequence(&[Choice::B, Choice::A]).unwrap();
        assert_eq!(
            answers.classify(),
            Err(EthicsError::Incomplete {
                answered: 2,
                total: 6
            })
        );
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let mut answers = EthicsAnswers::default();
        assert_eq!(
            answers.answer(42, Choice::A),
            Err(EthicsError::UnknownScenario(42))
        );
    }

    #[test]
    fn skewed_radars_pick_a_keeper() {
        let environment = Radar {
            environment: 5,
            ..Radar::default()
        };
        assert_eq!(environment.classify(), EthicsType::EnvironmentKeeper);

        let people = Radar {
            people: 5,
            ..Radar::default()
        };
        assert_eq!(people.classify(), EthicsType::PeopleKeeper);

        let tied = Radar {
            environment: 4,
            people: 4,
            ..Radar::default()
        };
        assert_eq!(tied.classify(), EthicsType::RuleKeeper);
    }

    #[test]
    fn result_serializes_sheet_label() {
        let answers = EthicsAnswers::from_sequence(&[Choice::B; 6]).unwrap();
        let result = EthicsResult::complete(answers, "지구를 지킬게요".into(), "민준".into()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["userType"], "균형잡이");
        assert_eq!(json["choices"]["1"], "B");
    }
}
