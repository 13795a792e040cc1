//! Bean 解析器抽象接口

use infrastructure_common::{Bean, ContractType, Qualifier, ResolutionResult};
use std::fmt;
use std::sync::Arc;

/// Bean 解析器 trait
///
/// 对同一份注册表快照，相同的输入总是得到同一个 Bean
pub trait BeanResolver: Send + Sync {
    /// 按 (类型, 限定符) 解析唯一 Bean
    ///
    /// 空限定符集合等价于 `{@Default}`
    fn resolve(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> ResolutionResult<Arc<Bean>>;

    /// 按名称解析唯一 Bean
    fn resolve_name(&self, name: &str) -> ResolutionResult<Arc<Bean>>;

    /// 满足 (类型, 限定符) 的全部已启用 Bean，按标识排序
    fn candidates(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> Vec<Arc<Bean>>;

    /// 检查是否可以解析
    ///
    /// 没有候选或只有一个候选时不经过 `resolve`
    fn can_resolve(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> bool {
        match self.candidates(ty, qualifiers).len() {
            0 => false,
            1 => true,
            _ => self.resolve(ty, qualifiers).is_ok(),
        }
    }
}

/// 解析请求
///
/// 作为缓存键使用，限定符已排序去重
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionRequest {
    pub ty: ContractType,
    pub qualifiers: Vec<Qualifier>,
}

impl ResolutionRequest {
    /// 创建解析请求
    pub fn new(ty: ContractType, qualifiers: &[Qualifier]) -> Self {
        let mut qualifiers = qualifiers.to_vec();
        qualifiers.sort();
        qualifiers.dedup();
        Self { ty, qualifiers }
    }

    /// 限定符的文本形式
    pub fn qualifier_names(&self) -> Vec<String> {
        self.qualifiers.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.ty, self.qualifier_names().join(", "))
    }
}
