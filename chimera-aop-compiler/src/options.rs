//! 处理器选项

use crate::config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, TomlPropertySource,
};
use crate::constants::*;
use crate::error::{ProcessorError, Result};
use crate::handler::HandlerPolicy;
use crate::logging::LoggingConfig;
use crate::validator::ValidationPolicy;
use once_cell::sync::Lazy;
use regex::Regex;

static PACKAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("package name pattern is valid")
});

/// 处理器选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// 不生成依赖注入模块
    pub disable_module_generation: bool,

    /// 不输出运行时类型（运行时库已经在类路径上）
    pub disable_runtime_generation: bool,

    /// 依赖注入模块所在的包
    pub module_package: String,

    /// 运行时库所在的包（`AbstractMethodInvocation` 从这里导入）
    pub runtime_package: String,

    pub validation_policy: ValidationPolicy,

    pub handler_policy: HandlerPolicy,

    /// 处理器自身的日志配置
    pub logging: LoggingConfig,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            disable_module_generation: false,
            disable_runtime_generation: false,
            module_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            validation_policy: ValidationPolicy::default(),
            handler_policy: HandlerPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProcessorOptions {
    /// 从宿主传入的键值对解析
    ///
    /// 除了这些键值对，还会读取 `config-file` 指向的 TOML 文件，以及
    /// `CHIMERA_AOP_` 前缀的环境变量（优先级最高）。
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = MapPropertySource::new("processor-options");
        for (key, value) in pairs {
            source = source.with_property(key, ConfigValue::String(value.into()));
        }

        let mut env = Environment::new();
        env.add_property_source(Box::new(source));
        env.add_property_source(Box::new(EnvironmentPropertySource::new(OPTION_ENV_PREFIX)));
        if let Some(path) = env.get_string(OPTION_CONFIG_FILE) {
            env.add_property_source(Box::new(TomlPropertySource::from_file(&path)?));
        }

        Self::from_environment(&env)
    }

    /// 从配置环境解析
    pub fn from_environment(env: &Environment) -> Result<Self> {
        let runtime_package = match env.get_string(OPTION_RUNTIME_PACKAGE) {
            Some(package) => parse_package(OPTION_RUNTIME_PACKAGE, package)?,
            None => DEFAULT_RUNTIME_PACKAGE.to_string(),
        };
        let module_package = match env.get_string(OPTION_MODULE_PACKAGE) {
            Some(package) => parse_package(OPTION_MODULE_PACKAGE, package)?,
            None => runtime_package.clone(),
        };
        let disable_module_generation = parse_flag(env, OPTION_DISABLE_MODULE_GENERATION)?;
        let disable_runtime_generation = parse_flag(env, OPTION_DISABLE_RUNTIME_GENERATION)?;
        let validation_policy = parse_with(env, OPTION_VALIDATION_POLICY)?.unwrap_or_default();
        let handler_policy = parse_with(env, OPTION_HANDLER_POLICY)?.unwrap_or_default();

        let mut logging = LoggingConfig::default();
        if let Some(level) = parse_with(env, OPTION_LOG_LEVEL)? {
            logging = logging.level(level);
        }
        if let Some(format) = parse_with(env, OPTION_LOG_FORMAT)? {
            logging = logging.format(format);
        }

        let options = Self {
            disable_module_generation,
            disable_runtime_generation,
            module_package,
            runtime_package,
            validation_policy,
            handler_policy,
            logging,
        };
        tracing::debug!("Processor options: {:?}", options);
        Ok(options)
    }

    pub fn with_module_package(mut self, package: impl Into<String>) -> Self {
        self.module_package = package.into();
        self
    }

    pub fn with_module_generation_disabled(mut self, disabled: bool) -> Self {
        self.disable_module_generation = disabled;
        self
    }

    pub fn with_runtime_generation_disabled(mut self, disabled: bool) -> Self {
        self.disable_runtime_generation = disabled;
        self
    }

    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation_policy = policy;
        self
    }

    pub fn with_handler_policy(mut self, policy: HandlerPolicy) -> Self {
        self.handler_policy = policy;
        self
    }
}

fn parse_package(key: &str, value: String) -> Result<String> {
    if PACKAGE_NAME.is_match(&value) {
        Ok(value)
    } else {
        Err(ProcessorError::InvalidOption {
            key: key.to_string(),
            value,
            reason: "not a valid package name".to_string(),
        })
    }
}

fn parse_flag(env: &Environment, key: &str) -> Result<bool> {
    match env.get(key) {
        Some(value) => value.as_bool().ok_or_else(|| ProcessorError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
        None => Ok(false),
    }
}

fn parse_with<T>(env: &Environment, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    env.get_string(key)
        .map(|value| {
            value.parse().map_err(|reason| ProcessorError::InvalidOption {
                key: key.to_string(),
                value,
                reason,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};

    #[test]
    fn test_defaults() {
        let options = ProcessorOptions::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(options, ProcessorOptions::default());
        assert_eq!(options.module_package, "com.chimera.aop");
        assert_eq!(options.validation_policy, ValidationPolicy::Strict);
        assert_eq!(options.handler_policy, HandlerPolicy::FailFast);
    }

    #[test]
    fn test_parse_pairs() {
        let options = ProcessorOptions::from_pairs([
            ("disable-module-generation", "true"),
            ("runtime-package", "org.example.aop"),
            ("validation-policy", "lenient"),
            ("handler-policy", "lenient"),
        ])
        .unwrap();
        assert!(options.disable_module_generation);
        assert!(!options.disable_runtime_generation);
        assert_eq!(options.runtime_package, "org.example.aop");
        // 模块包默认跟随运行时包
        assert_eq!(options.module_package, "org.example.aop");
        assert_eq!(options.validation_policy, ValidationPolicy::Lenient);
        assert_eq!(options.handler_policy, HandlerPolicy::Lenient);
    }

    #[test]
    fn test_logging_options() {
        let options =
            ProcessorOptions::from_pairs([("log-level", "debug"), ("log-format", "json")]).unwrap();
        assert_eq!(options.logging.level, LogLevel::Debug);
        assert_eq!(options.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        let err = ProcessorOptions::from_pairs([("module-package", "com..bad")]).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidOption { ref key, .. } if key == "module-package"));

        assert!(ProcessorOptions::from_pairs([("disable-module-generation", "sometimes")]).is_err());
        assert!(ProcessorOptions::from_pairs([("disable-runtime-generation", "maybe")]).is_err());
        assert!(ProcessorOptions::from_pairs([("validation-policy", "paranoid")]).is_err());
        assert!(ProcessorOptions::from_pairs([("log-level", "loud")]).is_err());
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aop.toml");
        std::fs::write(&path, "module-package = \"com.example.di\"\n").unwrap();

        let options =
            ProcessorOptions::from_pairs([("config-file", path.to_string_lossy().to_string())])
                .unwrap();
        assert_eq!(options.module_package, "com.example.di");
    }
}
