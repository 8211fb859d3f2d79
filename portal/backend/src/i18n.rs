//! Localization

use risk_inference::RiskLevel;
use serde::{Deserialize, Serialize};

/// UI language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    /// Strict parse of a stored or submitted code.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "ar" => Some(Language::Ar),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Parse a `/lang/<code>` request; unsupported codes fall back to Arabic.
    pub fn from_code_or_default(code: &str) -> Self {
        Self::parse(code).unwrap_or_default()
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn dir(&self) -> &'static str {
        match self {
            Language::Ar => "rtl",
            Language::En => "ltr",
        }
    }

    pub fn texts(&self) -> &'static Translations {
        match self {
            Language::Ar => &AR,
            Language::En => &EN,
        }
    }
}

/// Every user-facing string of the portal
pub struct Translations {
    pub title: &'static str,
    pub project_title: &'static str,
    pub login: &'static str,
    pub username: &'static str,
    pub password: &'static str,
    pub submit: &'static str,
    pub logout: &'static str,
    pub predict: &'static str,
    pub day: &'static str,
    pub hour: &'static str,
    pub injuries: &'static str,
    pub location: &'static str,
    pub result: &'static str,
    pub risk_score: &'static str,
    pub risk_level: &'static str,
    pub admin_panel: &'static str,
    pub history: &'static str,
    pub bad_login: &'static str,
    pub statistics: &'static str,
    pub total: &'static str,
    pub user: &'static str,
    pub created_at: &'static str,
    pub dashboard: &'static str,
    pub no_history: &'static str,
    pub low: &'static str,
    pub medium: &'static str,
    pub high: &'static str,
    pub switch_language: &'static str,
}

impl Translations {
    pub fn level(&self, level: RiskLevel) -> &'static str {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

pub static AR: Translations = Translations {
    title: "نظام التنبؤ بحوادث المرور",
    project_title: "نظام التنبؤ بحوادث المرور باستخدام تحليل البيانات الضخمة",
    login: "تسجيل الدخول",
    username: "اسم المستخدم",
    password: "كلمة المرور",
    submit: "دخول",
    logout: "تسجيل خروج",
    predict: "تنفيذ التنبؤ",
    day: "اليوم",
    hour: "الساعة",
    injuries: "عدد الإصابات",
    location: "الموقع / الشارع",
    result: "نتيجة التنبؤ",
    risk_score: "مستوى الخطورة",
    risk_level: "تصنيف الخطورة",
    admin_panel: "لوحة الأدمن",
    history: "سجل التنبؤات",
    bad_login: "اسم المستخدم أو كلمة المرور غير صحيحة",
    statistics: "إحصائيات الخطورة",
    total: "الإجمالي",
    user: "المستخدم",
    created_at: "التاريخ",
    dashboard: "لوحة التحكم",
    no_history: "لا توجد تنبؤات بعد",
    low: "منخفض",
    medium: "متوسط",
    high: "مرتفع",
    switch_language: "English",
};

pub static EN: Translations = Translations {
    title: "Traffic Accident Prediction System",
    project_title: "AI-Based Traffic Accident Prediction Using Big Data Analytics",
    login: "Login",
    username: "Username",
    password: "Password",
    submit: "Sign in",
    logout: "Logout",
    predict: "Run Prediction",
    day: "Day",
    hour: "Hour",
    injuries: "Injuries",
    location: "Location / Road",
    result: "Prediction Result",
    risk_score: "Risk Score",
    risk_level: "Risk Level",
    admin_panel: "Admin Panel",
    history: "Prediction History",
    bad_login: "Invalid username or password",
    statistics: "Risk Statistics",
    total: "Total",
    user: "User",
    created_at: "Created",
    dashboard: "Dashboard",
    no_history: "No predictions yet",
    low: "Low",
    medium: "Medium",
    high: "High",
    switch_language: "العربية",
};
