/// 语言 → 入口文件扩展名
use phf::phf_map;

static EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "python" => "py",
    "javascript" => "js",
    "node" => "js",
};

/// 未知语言回退到 `txt`
pub fn extension_for(language: &str) -> &'static str {
    EXTENSIONS
        .get(language.trim().to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or("txt")
}

/// 入口文件名，例如 `main.py`
pub fn entry_file_name(language: &str) -> String {
    format!("main.{}", extension_for(language))
}
