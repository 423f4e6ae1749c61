//! Fixed classroom content: missions, robot parts, and the labels the
//! teacher dashboard shows for sheet values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub problem: &'static str,
    pub robot_type: &'static str,
}

pub static MISSIONS: [Mission; 3] = [
    Mission {
        id: "water",
        title: "물 배달 용사",
        description: "물이 부족한 나라에 깨끗한 물을 전달해요",
        problem: "전 세계 22억 명이 깨끗한 물을 마시지 못해요",
        robot_type: "운반형",
    },
    Mission {
        id: "garbage",
        title: "쓰레기 청소 용사",
        description: "바다와 땅의 쓰레기를 치워요",
        problem: "매년 800만 톤의 플라스틱이 바다로 흘러가요",
        robot_type: "수거형",
    },
    Mission {
        id: "monitor",
        title: "환경 감시 용사",
        description: "대기오염과 수질오염을 감시해요",
        problem: "대기오염으로 매년 700만 명이 사망해요",
        robot_type: "감지형",
    },
];

pub fn find_mission(id: &str) -> Option<&'static Mission> {
    MISSIONS.iter().find(|mission| mission.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartCategory {
    Body,
    Head,
    Arms,
    Legs,
    Accessories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotPart {
    pub id: &'static str,
    pub name: &'static str,
    pub category: PartCategory,
    /// Building-kit component the paper part stands in for.
    pub kit_component: &'static str,
    pub description: &'static str,
}

const fn part(
    id: &'static str,
    name: &'static str,
    category: PartCategory,
    kit_component: &'static str,
    description: &'static str,
) -> RobotPart {
    RobotPart {
        id,
        name,
        category,
        kit_component,
        description,
    }
}

pub static ROBOT_PARTS: [RobotPart; 17] = [
    part("body1", "기본 몸체", PartCategory::Body, "기본 허브 블록", "로봇의 중심이 되는 몸체예요"),
    part("body2", "탱크 몸체", PartCategory::Body, "확장 허브 블록", "물이나 물건을 담을 수 있는 큰 몸체예요"),
    part("body3", "드론 몸체", PartCategory::Body, "경량 허브 블록", "가볍고 작은 몸체예요"),
    part("head1", "센서 헤드", PartCategory::Head, "거리 센서 + 컬러 센서", "주변을 감지하는 센서가 달린 머리예요"),
    part("head2", "카메라 헤드", PartCategory::Head, "카메라 모듈", "사진과 영상을 찍을 수 있는 머리예요"),
    part("head3", "안테나 헤드", PartCategory::Head, "무선 통신 모듈", "신호를 주고받는 안테나가 달린 머리예요"),
    part("arm1", "집게 팔", PartCategory::Arms, "중형 모터 + 집게 부품", "물건을 집을 수 있는 집게 팔이에요"),
    part("arm2", "물통 팔", PartCategory::Arms, "대형 모터 + 물통 부품", "물을 담아 나를 수 있는 팔이에요"),
    part("arm3", "청소 팔", PartCategory::Arms, "중형 모터 + 브러시 부품", "쓰레기를 쓸어모을 수 있는 팔이에요"),
    part("leg1", "바퀴", PartCategory::Legs, "바퀴 부품 (2개)", "빠르게 이동할 수 있는 바퀴예요"),
    part("leg2", "무한궤도", PartCategory::Legs, "무한궤도 부품", "어려운 지형도 갈 수 있는 무한궤도예요"),
    part("leg3", "다리", PartCategory::Legs, "다리 부품 (2개)", "계단도 오를 수 있는 다리예요"),
    part("leg4", "프로펠러", PartCategory::Legs, "프로펠러 부품 (4개)", "하늘을 날 수 있는 프로펠러예요"),
    part("acc1", "물탱크", PartCategory::Accessories, "물탱크 부품", "물을 저장하는 물탱크예요"),
    part("acc2", "쓰레기통", PartCategory::Accessories, "쓰레기통 부품", "쓰레기를 담는 통이에요"),
    part("acc3", "태양광 패널", PartCategory::Accessories, "태양광 패널 부품", "태양 에너지를 모으는 패널이에요"),
    part("acc4", "센서", PartCategory::Accessories, "다양한 센서 모듈", "환경을 감지하는 센서예요"),
];

pub fn find_part(id: &str) -> Option<&'static RobotPart> {
    ROBOT_PARTS.iter().find(|part| part.id == id)
}

pub fn parts_in(category: PartCategory) -> impl Iterator<Item = &'static RobotPart> {
    ROBOT_PARTS
        .iter()
        .filter(move |part| part.category == category)
}

/// Parts suggested to students for each mission.
pub fn recommended_parts(mission_id: &str) -> &'static [&'static str] {
    match mission_id {
        "water" => &["acc1", "leg1", "arm2"],
        "garbage" => &["acc2", "arm1", "leg2"],
        "monitor" => &["acc4", "head2", "leg4"],
        _ => &[],
    }
}

/// Display label for an activity id as it appears in the sheet. Unknown
/// ids are shown as test activities.
pub fn activity_label(activity_id: &str) -> String {
    let label = match activity_id {
        "1차시" => "🔍 1차시 · AI는 무엇일까?",
        "2차시" => "🤖 2차시 · 로봇을 움직여봐요!",
        "3차시" => "⚡ 3차시 · 전기도 탐구해요",
        "4차시" => "🌱 4차시 · AI 윤리와 나",
        "" => return "🧪 테스트 미션".to_string(),
        other => return format!("🧪 {other}"),
    };
    label.to_string()
}

/// Display label for a result category. Sheet values carry a " 유형"
/// suffix which is ignored when matching known types.
pub fn result_label(category: &str) -> String {
    let label = match category.trim_end_matches(" 유형").trim() {
        "균형잡이" => "⚖️ 균형잡이",
        "환경지킴이" => "🌱 환경지킴이",
        "사람지킴이" => "🤝 사람지킴이",
        "" => return "🔍 기타".to_string(),
        _ => return format!("🔍 {category}"),
    };
    label.to_string()
}
