//! Bean 注册表抽象接口

use infrastructure_common::{Bean, BeanId, ContractType};
use std::sync::Arc;

/// Bean 查找 trait
///
/// 已发布的注册表是只读的，所有方法都可以并发调用。
/// 被特化的 Bean 不会出现在按类型 / 按名称的查找结果中
pub trait BeanLookup: Send + Sync {
    /// 查找类型闭包中包含可赋值给 `ty` 的类型的 Bean
    fn find_by_type(&self, ty: &ContractType) -> Vec<Arc<Bean>>;

    /// 按名称查找 Bean
    fn find_by_name(&self, name: &str) -> Vec<Arc<Bean>>;

    /// 按标识获取 Bean，被特化的 Bean 也可以取到
    fn bean(&self, id: &BeanId) -> Option<Arc<Bean>>;

    /// 全部托管 Bean
    fn beans(&self) -> Vec<Arc<Bean>>;

    /// 获取直接特化给定 Bean 的特化者
    fn specializer_of(&self, id: &BeanId) -> Option<Arc<Bean>>;

    /// 是否存在给定标识的 Bean
    fn contains(&self, id: &BeanId) -> bool {
        self.bean(id).is_some()
    }
}
