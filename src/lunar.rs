use chrono::{Datelike, NaiveDate};

/// Month sizes and leap month for lunar years 1900..=2100.
///
/// Bits 0-3 hold the leap month (0 when the year has none), bits 4-15 flag
/// the months 12..1 that have 30 days, bit 16 flags a 30 day leap month.
const LUNAR_YEARS: [u32; 201] = [
    0x04bd8, 0x04ae0, 0x0a570, 0x054d5, 0x0d260, 0x0d950, 0x16554, 0x056a0, 0x09ad0, 0x055d2,
    0x04ae0, 0x0a5b6, 0x0a4d0, 0x0d250, 0x1d255, 0x0b540, 0x0d6a0, 0x0ada2, 0x095b0, 0x14977,
    0x04970, 0x0a4b0, 0x0b4b5, 0x06a50, 0x06d40, 0x1ab54, 0x02b60, 0x09570, 0x052f2, 0x04970,
    0x06566, 0x0d4a0, 0x0ea50, 0x16a95, 0x05ad0, 0x02b60, 0x186e3, 0x092e0, 0x1c8d7, 0x0c950,
    0x0d4a0, 0x1d8a6, 0x0b550, 0x056a0, 0x1a5b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0b557,
    0x06ca0, 0x0b550, 0x15355, 0x04da0, 0x0a5b0, 0x14573, 0x052b0, 0x0a9a8, 0x0e950, 0x06aa0,
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05260, 0x0f263, 0x0d950, 0x05b57, 0x056a0,
    0x096d0, 0x04dd5, 0x04ad0, 0x0a4d0, 0x0d4d4, 0x0d250, 0x0d558, 0x0b540, 0x0b6a0, 0x195a6,
    0x095b0, 0x049b0, 0x0a974, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0af46, 0x0ab60, 0x09570,
    0x04af5, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06b58, 0x05ac0, 0x0ab60, 0x096d5, 0x092e0,
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5,
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930,
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530,
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45,
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0,
    0x14b63, 0x09370, 0x049f8, 0x04970, 0x064b0, 0x168a6, 0x0ea50, 0x06b20, 0x1a6c4, 0x0aae0,
    0x0a2e0, 0x0d2e3, 0x0c960, 0x0d557, 0x0d4a0, 0x0da50, 0x05d55, 0x056a0, 0x0a6d0, 0x055d4,
    0x052d0, 0x0a9b8, 0x0a950, 0x0b4a0, 0x0b6a6, 0x0ad50, 0x055a0, 0x0aba4, 0x0a5b0, 0x052b0,
    0x0b273, 0x06930, 0x07337, 0x06aa0, 0x0ad50, 0x14b55, 0x04b60, 0x0a570, 0x054e4, 0x0d160,
    0x0e968, 0x0d520, 0x0daa0, 0x16aa6, 0x056d0, 0x04ae0, 0x0a9d4, 0x0a2d0, 0x0d150, 0x0f252,
    0x0d520,
];

const FIRST_LUNAR_YEAR: i32 = 1900;

const SOLAR_HOLIDAYS: [((u32, u32), &str); 13] = [
    ((1, 1), "New Year's Day"),
    ((2, 14), "Valentine's Day"),
    ((3, 8), "Women's Day"),
    ((3, 12), "Arbor Day"),
    ((4, 1), "April Fools' Day"),
    ((5, 1), "Labour Day"),
    ((5, 4), "Youth Day"),
    ((6, 1), "Children's Day"),
    ((7, 1), "Party Day"),
    ((8, 1), "Army Day"),
    ((9, 10), "Teachers' Day"),
    ((10, 1), "National Day"),
    ((12, 25), "Christmas"),
];

const MONTH_NAMES: [&str; 12] = [
    "正月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "冬月", "腊月",
];
const DIGITS: [&str; 10] = ["", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_leap: bool,
}

impl LunarDate {
    /// Traditional day-of-month label: 初一 .. 初十, 十一 .. 二十, 廿一 .. 三十.
    pub fn day_label(&self) -> String {
        let day = self.day as usize;
        match day {
            10 => "初十".to_string(),
            20 => "二十".to_string(),
            30 => "三十".to_string(),
            1..=9 => format!("初{}", DIGITS[day]),
            11..=19 => format!("十{}", DIGITS[day - 10]),
            21..=29 => format!("廿{}", DIGITS[day - 20]),
            _ => String::new(),
        }
    }

    pub fn month_label(&self) -> String {
        let name = MONTH_NAMES
            .get((self.month as usize).wrapping_sub(1))
            .copied()
            .unwrap_or("");
        if self.is_leap {
            format!("闰{}", name)
        } else {
            name.to_string()
        }
    }

    pub fn full_label(&self) -> String {
        format!("{}{}", self.month_label(), self.day_label())
    }
}

/// Conversion from a Gregorian date to its lunar calendar date.
pub trait GregorianToLunar {
    /// Returns `None` when the date falls outside the supported range.
    fn to_lunar(&self, date: NaiveDate) -> Option<LunarDate>;
}

/// Table driven Chinese lunisolar calendar, 1900-01-31 through 2100.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChineseLunisolar;

impl ChineseLunisolar {
    fn epoch() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(1900, 1, 31)
    }
}

impl GregorianToLunar for ChineseLunisolar {
    fn to_lunar(&self, date: NaiveDate) -> Option<LunarDate> {
        let mut offset = (date - Self::epoch()?).num_days();
        if offset < 0 {
            return None;
        }

        let mut year = FIRST_LUNAR_YEAR;
        let mut info = None;
        for &entry in LUNAR_YEARS.iter() {
            let days = i64::from(year_days(entry));
            if offset < days {
                info = Some(entry);
                break;
            }
            offset -= days;
            year += 1;
        }
        let info = info?;

        let leap = leap_month(info);
        let mut month = 1;
        let mut is_leap = false;
        loop {
            let days = i64::from(if is_leap {
                leap_days(info)
            } else {
                month_days(info, month)
            });
            if offset < days {
                break;
            }
            offset -= days;
            if !is_leap && leap == month {
                is_leap = true;
            } else {
                is_leap = false;
                month += 1;
            }
        }

        Some(LunarDate {
            year,
            month,
            day: offset as u32 + 1,
            is_leap,
        })
    }
}

fn leap_month(info: u32) -> u32 {
    info & 0xf
}

fn leap_days(info: u32) -> u32 {
    if leap_month(info) == 0 {
        0
    } else if info & 0x10000 != 0 {
        30
    } else {
        29
    }
}

fn month_days(info: u32, month: u32) -> u32 {
    if info & (0x10000 >> month) != 0 {
        30
    } else {
        29
    }
}

fn year_days(info: u32) -> u32 {
    let big_months = (1..=12).filter(|&m| month_days(info, m) == 30).count() as u32;
    12 * 29 + big_months + leap_days(info)
}

/// Fixed Gregorian holiday for a month and day, independent of year.
pub fn solar_holiday(month: u32, day: u32) -> Option<&'static str> {
    SOLAR_HOLIDAYS
        .iter()
        .find(|(md, _)| *md == (month, day))
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub lunar: Option<LunarDate>,
    pub lunar_label: String,
    pub holiday_label: Option<&'static str>,
}

impl Annotation {
    /// Label for a day cell: the holiday wins over the lunar day.
    pub fn display_label(&self) -> &str {
        self.holiday_label.unwrap_or(self.lunar_label.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LunarAnnotator<C = ChineseLunisolar> {
    converter: C,
}

impl LunarAnnotator<ChineseLunisolar> {
    pub fn new() -> Self {
        LunarAnnotator {
            converter: ChineseLunisolar,
        }
    }
}

impl<C: GregorianToLunar> LunarAnnotator<C> {
    pub fn with_converter(converter: C) -> Self {
        LunarAnnotator { converter }
    }

    pub fn annotate(&self, date: NaiveDate) -> Annotation {
        let holiday_label = solar_holiday(date.month(), date.day());
        let lunar = self.converter.to_lunar(date);
        let lunar_label = lunar.map(|l| l.day_label()).unwrap_or_default();
        Annotation {
            lunar,
            lunar_label,
            holiday_label,
        }
    }
}
