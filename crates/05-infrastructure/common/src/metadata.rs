//! 契约类型元数据
//!
//! 提供契约类型（原始类型 + 泛型参数）、方法签名以及类型目录

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

/// 顶层类型名称，是所有类型的超类型
pub const OBJECT_TYPE: &str = "Object";

/// 契约类型
///
/// Bean 通过类型闭包暴露一组契约类型，注入点以契约类型发起请求
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ContractTypeRepr")]
pub struct ContractType {
    /// 原始类型名称
    pub raw: String,
    /// 泛型参数
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeArg>,
}

/// 泛型参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeArg {
    /// 实际类型
    Actual(ContractType),
    /// 通配符
    Wildcard {
        #[serde(default)]
        upper: Option<Box<ContractType>>,
        #[serde(default)]
        lower: Option<Box<ContractType>>,
    },
    /// 类型变量
    Variable {
        name: String,
        #[serde(default)]
        bounds: Vec<ContractType>,
    },
}

impl ContractType {
    /// 创建原始类型
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            raw: name.into(),
            args: Vec::new(),
        }
    }

    /// 创建参数化类型
    pub fn parameterized(name: impl Into<String>, args: Vec<TypeArg>) -> Self {
        Self {
            raw: name.into(),
            args,
        }
    }

    /// 顶层类型
    pub fn object() -> Self {
        Self::raw(OBJECT_TYPE)
    }

    /// 添加一个实际类型参数
    pub fn of(mut self, arg: ContractType) -> Self {
        self.args.push(TypeArg::Actual(arg));
        self
    }

    /// 添加一个泛型参数
    pub fn with_arg(mut self, arg: TypeArg) -> Self {
        self.args.push(arg);
        self
    }

    /// 是否为参数化类型
    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    /// 是否为顶层类型
    pub fn is_object(&self) -> bool {
        self.raw == OBJECT_TYPE && self.args.is_empty()
    }

    /// 用给定的绑定替换类型变量
    pub fn substitute(&self, bindings: &HashMap<&str, &TypeArg>) -> Self {
        Self {
            raw: self.raw.clone(),
            args: self
                .args
                .iter()
                .map(|arg| arg.substitute(bindings))
                .collect(),
        }
    }
}

impl TypeArg {
    /// 实际类型参数
    pub fn actual(ty: ContractType) -> Self {
        Self::Actual(ty)
    }

    /// 无界通配符 `?`
    pub fn wildcard() -> Self {
        Self::Wildcard {
            upper: None,
            lower: None,
        }
    }

    /// 上界通配符 `? extends T`
    pub fn extends(bound: ContractType) -> Self {
        Self::Wildcard {
            upper: Some(Box::new(bound)),
            lower: None,
        }
    }

    /// 下界通配符 `? super T`
    pub fn super_of(bound: ContractType) -> Self {
        Self::Wildcard {
            upper: None,
            lower: Some(Box::new(bound)),
        }
    }

    /// 无界类型变量
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    /// 有界类型变量
    pub fn bounded(name: impl Into<String>, bounds: Vec<ContractType>) -> Self {
        Self::Variable {
            name: name.into(),
            bounds,
        }
    }

    /// 是否为无界类型变量或顶层类型
    pub fn is_unbounded(&self) -> bool {
        match self {
            Self::Actual(ty) => ty.is_object(),
            Self::Variable { bounds, .. } => bounds.iter().all(ContractType::is_object),
            Self::Wildcard { .. } => false,
        }
    }

    fn substitute(&self, bindings: &HashMap<&str, &TypeArg>) -> Self {
        match self {
            Self::Actual(ty) => Self::Actual(ty.substitute(bindings)),
            Self::Variable { name, .. } => match bindings.get(name.as_str()) {
                Some(bound) => (*bound).clone(),
                None => self.clone(),
            },
            Self::Wildcard { upper, lower } => Self::Wildcard {
                upper: upper.as_ref().map(|ty| Box::new(ty.substitute(bindings))),
                lower: lower.as_ref().map(|ty| Box::new(ty.substitute(bindings))),
            },
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (index, arg) in self.args.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actual(ty) => write!(f, "{}", ty),
            Self::Wildcard { upper, lower } => {
                write!(f, "?")?;
                if let Some(upper) = upper {
                    write!(f, " extends {}", upper)?;
                }
                if let Some(lower) = lower {
                    write!(f, " super {}", lower)?;
                }
                Ok(())
            }
            Self::Variable { name, bounds } => {
                write!(f, "{}", name)?;
                for (index, bound) in bounds.iter().enumerate() {
                    let separator = if index == 0 { " extends " } else { " & " };
                    write!(f, "{}{}", separator, bound)?;
                }
                Ok(())
            }
        }
    }
}

/// 类型文本解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("无法解析类型 `{input}`: {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for ContractType {
    type Err = TypeParseError;

    /// 解析形如 `Map<String, List<? extends Number>>` 的类型文本
    ///
    /// 文本形式只支持实际类型与通配符，类型变量需要使用结构化形式声明
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser::new(s);
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.position < parser.chars.len() {
            return Err(parser.error("类型之后存在多余字符"));
        }
        Ok(ty)
    }
}

struct TypeParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            position: 0,
        }
    }

    fn error(&self, reason: &str) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            reason: format!("{} (位置 {})", reason, self.position),
        }
    }

    fn skip_whitespace(&mut self) {
        while self
            .chars
            .get(self.position)
            .is_some_and(|c| c.is_whitespace())
        {
            self.position += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.position).copied()
    }

    fn identifier(&mut self) -> Result<String, TypeParseError> {
        self.skip_whitespace();
        let start = self.position;
        while self
            .chars
            .get(self.position)
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$'))
        {
            self.position += 1;
        }
        if start == self.position {
            return Err(self.error("期望类型名称"));
        }
        Ok(self.chars[start..self.position].iter().collect())
    }

    fn parse_type(&mut self) -> Result<ContractType, TypeParseError> {
        let raw = self.identifier()?;
        let mut ty = ContractType::raw(raw);
        if self.peek() == Some('<') {
            self.position += 1;
            loop {
                ty.args.push(self.parse_arg()?);
                match self.peek() {
                    Some(',') => self.position += 1,
                    Some('>') => {
                        self.position += 1;
                        break;
                    }
                    _ => return Err(self.error("期望 `,` 或 `>`")),
                }
            }
        }
        Ok(ty)
    }

    fn parse_arg(&mut self) -> Result<TypeArg, TypeParseError> {
        if self.peek() != Some('?') {
            return Ok(TypeArg::Actual(self.parse_type()?));
        }
        self.position += 1;
        match self.peek() {
            Some(',') | Some('>') => Ok(TypeArg::wildcard()),
            _ => {
                let keyword = self.identifier()?;
                let bound = self.parse_type()?;
                match keyword.as_str() {
                    "extends" => Ok(TypeArg::extends(bound)),
                    "super" => Ok(TypeArg::super_of(bound)),
                    _ => Err(self.error("通配符只支持 extends / super")),
                }
            }
        }
    }
}

/// 反序列化时既接受类型文本也接受结构化形式
#[derive(Deserialize)]
#[serde(untagged)]
enum ContractTypeRepr {
    Text(String),
    Structured {
        raw: String,
        #[serde(default)]
        args: Vec<TypeArg>,
    },
}

impl TryFrom<ContractTypeRepr> for ContractType {
    type Error = TypeParseError;

    fn try_from(repr: ContractTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            ContractTypeRepr::Text(text) => text.parse(),
            ContractTypeRepr::Structured { raw, args } => Ok(Self { raw, args }),
        }
    }
}

/// 方法签名
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSignature {
    /// 方法名
    pub name: String,
    /// 参数类型
    #[serde(default)]
    pub params: Vec<ContractType>,
}

impl MethodSignature {
    /// 创建方法签名
    pub fn new(name: impl Into<String>, params: Vec<ContractType>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// 创建无参方法签名
    pub fn nullary(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

/// 类型描述符
///
/// 记录一个原始类型的类型参数、直接超类型和声明的方法
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// 原始类型名称
    pub raw: String,
    /// 类型参数名称
    #[serde(default)]
    pub type_params: Vec<String>,
    /// 直接超类型，可以引用类型参数
    #[serde(default)]
    pub supertypes: Vec<ContractType>,
    /// 声明的方法
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
}

impl TypeDescriptor {
    /// 创建类型描述符
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    /// 添加类型参数
    pub fn with_type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    /// 添加直接超类型
    pub fn extends(mut self, supertype: ContractType) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// 添加声明的方法
    pub fn declares(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }
}

/// 类型目录
///
/// 用于通配符/类型变量边界检查和装饰器方法声明检查，构建后只读
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 从描述符列表构建目录，后出现的同名描述符覆盖先出现的
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.insert(descriptor);
        }
        catalog
    }

    /// 添加描述符
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.raw.clone(), descriptor);
    }

    /// 获取描述符
    pub fn get(&self, raw: &str) -> Option<&TypeDescriptor> {
        self.types.get(raw)
    }

    /// 已登记的类型数量
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// 目录是否为空
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 判断 `sub` 是否为 `sup` 的子类型
    ///
    /// 参数化类型之间按不变性比较；原始超类型接受任何同名参数化子类型
    pub fn is_subtype(&self, sub: &ContractType, sup: &ContractType) -> bool {
        if sup.is_object() || sub == sup {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([sub.clone()]);
        while let Some(current) = queue.pop_front() {
            if current.raw == sup.raw && (!sup.is_parameterized() || current.args == sup.args) {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            queue.extend(self.direct_supertypes(&current));
        }
        false
    }

    /// 计算给定类型的直接超类型，并替换其中的类型参数
    pub fn direct_supertypes(&self, ty: &ContractType) -> Vec<ContractType> {
        let Some(descriptor) = self.types.get(&ty.raw) else {
            return Vec::new();
        };

        if descriptor.type_params.len() != ty.args.len() {
            return descriptor.supertypes.clone();
        }

        let bindings: HashMap<&str, &TypeArg> = descriptor
            .type_params
            .iter()
            .map(String::as_str)
            .zip(ty.args.iter())
            .collect();
        descriptor
            .supertypes
            .iter()
            .map(|supertype| supertype.substitute(&bindings))
            .collect()
    }

    /// 判断原始类型（或其任一超类型）是否声明了给定方法
    pub fn declares_method(&self, raw: &str, method: &MethodSignature) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([raw.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(descriptor) = self.types.get(&current) else {
                continue;
            };
            if descriptor.methods.contains(method) {
                return true;
            }
            queue.extend(descriptor.supertypes.iter().map(|ty| ty.raw.clone()));
        }
        false
    }
}
