use crate::application::bill_service::BillService;
use crate::application::customer_service::CustomerService;
use crate::application::dashboard_service::DashboardService;
use crate::application::inventory_service::InventoryService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::application::product_service::ProductService;
use crate::db::DbPool;
use crate::infrastructure::bill_store::LocalBillImageStore;
use crate::infrastructure::customer_repo::DieselCustomerRepository;
use crate::infrastructure::inventory_repo::DieselInventoryRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::payment_repo::DieselPaymentRepository;
use crate::infrastructure::product_repo::DieselProductRepository;

pub type Customers = CustomerService<DieselCustomerRepository, DieselProductRepository>;
pub type Products = ProductService<DieselProductRepository>;
pub type Orders =
    OrderService<DieselOrderRepository, DieselCustomerRepository, DieselProductRepository>;
pub type Payments = PaymentService<DieselPaymentRepository, DieselCustomerRepository>;
pub type Inventory = InventoryService<DieselInventoryRepository>;
pub type Bills = BillService<LocalBillImageStore, DieselCustomerRepository>;
pub type Dashboard = DashboardService<
    DieselInventoryRepository,
    DieselOrderRepository,
    DieselPaymentRepository,
    DieselCustomerRepository,
>;

/// Services shared by every worker. Wrapped in `web::Data`, so handlers can
/// move a clone into `web::block`.
pub struct AppState {
    pub customers: Customers,
    pub products: Products,
    pub orders: Orders,
    pub payments: Payments,
    pub inventory: Inventory,
    pub bills: Bills,
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new(pool: DbPool, bill_store: LocalBillImageStore) -> Self {
        let customers = || DieselCustomerRepository::new(pool.clone());
        let products = || DieselProductRepository::new(pool.clone());
        let orders = || DieselOrderRepository::new(pool.clone());
        let payments = || DieselPaymentRepository::new(pool.clone());
        let inventory = || DieselInventoryRepository::new(pool.clone());

        Self {
            customers: CustomerService::new(customers(), products()),
            products: ProductService::new(products()),
            orders: OrderService::new(orders(), customers(), products()),
            payments: PaymentService::new(payments(), customers()),
            inventory: InventoryService::new(inventory()),
            bills: BillService::new(bill_store, customers()),
            dashboard: DashboardService::new(inventory(), orders(), payments(), customers()),
        }
    }
}
